//! Conversions between row-major feature frames and batch tensors.

use burn::prelude::*;

use super::dense::to_vec;
use crate::error::{McepError, Result};

/// Stack equally wide rows into a `[rows, width]` tensor.
pub fn rows_to_tensor<B: Backend>(
    name: &str,
    rows: &[Vec<f32>],
    width: usize,
    device: &B::Device,
) -> Result<Tensor<B, 2>> {
    let mut flat = Vec::with_capacity(rows.len() * width);
    for row in rows {
        if row.len() != width {
            return Err(McepError::shape(name, width, row.len()));
        }
        flat.extend_from_slice(row);
    }
    let data = TensorData::new(flat, [rows.len(), width]);
    Ok(Tensor::from_data(data.convert::<B::FloatElem>(), device))
}

pub fn tensor_to_rows<B: Backend>(tensor: Tensor<B, 2>) -> Result<Vec<Vec<f32>>> {
    let [_, width] = tensor.dims();
    let flat = to_vec(tensor.into_data())?;
    if width == 0 {
        return Ok(Vec::new());
    }
    Ok(flat.chunks(width).map(|c| c.to_vec()).collect())
}
