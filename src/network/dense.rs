//! Dense (affine) stage with explicit parameter construction.
//!
//! Parameters are sampled from a caller-owned `StdRng` instead of the
//! backend's global generator, so two builds from the same seed are
//! identical regardless of what else ran in the process.

use burn::module::Param;
use burn::prelude::*;
use burn::tensor::{Distribution, TensorData};
use rand::rngs::StdRng;

use crate::error::{McepError, Result};

#[derive(Module, Debug)]
pub struct Dense<B: Backend> {
    /// Shape `[d_input, d_output]`
    weight: Param<Tensor<B, 2>>,
    /// Shape `[d_output]`
    bias: Param<Tensor<B, 1>>,
}

impl<B: Backend> Dense<B> {
    /// Glorot-uniform kernel, zero bias.
    pub fn glorot(d_input: usize, d_output: usize, rng: &mut StdRng, device: &B::Device) -> Self {
        let limit = (6.0 / (d_input + d_output) as f64).sqrt();
        let weight = sample([d_input, d_output], Distribution::Uniform(-limit, limit), rng, device);
        Self::from_tensors(weight, Tensor::zeros([d_output], device))
    }

    /// Normal(0, stddev) kernel, zero bias.
    pub fn normal(
        d_input: usize,
        d_output: usize,
        stddev: f64,
        rng: &mut StdRng,
        device: &B::Device,
    ) -> Self {
        let weight = sample([d_input, d_output], Distribution::Normal(0.0, stddev), rng, device);
        Self::from_tensors(weight, Tensor::zeros([d_output], device))
    }

    pub fn zeros(d_input: usize, d_output: usize, device: &B::Device) -> Self {
        Self::from_tensors(
            Tensor::zeros([d_input, d_output], device),
            Tensor::zeros([d_output], device),
        )
    }

    pub fn from_tensors(weight: Tensor<B, 2>, bias: Tensor<B, 1>) -> Self {
        Self {
            weight: Param::from_tensor(weight),
            bias: Param::from_tensor(bias),
        }
    }

    pub fn d_input(&self) -> usize {
        self.weight.val().dims()[0]
    }

    pub fn d_output(&self) -> usize {
        self.weight.val().dims()[1]
    }

    pub fn weight(&self) -> Tensor<B, 2> {
        self.weight.val()
    }

    pub fn bias(&self) -> Tensor<B, 1> {
        self.bias.val()
    }

    /// Flattened weights followed by the bias
    pub fn values(&self) -> Result<Vec<f32>> {
        let mut out = to_vec(self.weight.val().into_data())?;
        out.extend(to_vec(self.bias.val().into_data())?);
        Ok(out)
    }

    /// `x . W + b`
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        x.matmul(self.weight.val()) + self.bias.val().unsqueeze::<2>()
    }
}

fn sample<B: Backend, const D: usize>(
    shape: [usize; D],
    distribution: Distribution,
    rng: &mut StdRng,
    device: &B::Device,
) -> Tensor<B, D> {
    let data = TensorData::random::<f32, _, _>(shape, distribution, rng);
    Tensor::from_data(data.convert::<B::FloatElem>(), device)
}

pub(crate) fn to_vec(data: TensorData) -> Result<Vec<f32>> {
    data.convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| McepError::TensorData(format!("{:?}", e)))
}
