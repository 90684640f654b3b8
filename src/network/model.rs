//! Residual mcep regression network.
//!
//! `Converted = Dense_W(h3) + X` where `h_i = act(Dense_i(h_{i-1}))`.
//! The network learns a correction to its input rather than the target
//! itself.

use burn::nn::{LeakyRelu, LeakyReluConfig};
use burn::prelude::*;
use rand::rngs::StdRng;

use super::dense::Dense;
use super::spec::{Activation, NetworkSpec};
use crate::error::{McepError, Result};

/// Name of the feature input
pub const INPUT_X: &str = "X";
/// Name of the target input
pub const INPUT_Y: &str = "Y";
/// Name of the network output
pub const OUTPUT_CONVERTED: &str = "Converted";

#[derive(Module, Debug)]
pub struct HiddenStage<B: Backend> {
    dense: Dense<B>,
    activation: Option<LeakyRelu>,
}

impl<B: Backend> HiddenStage<B> {
    fn new(dense: Dense<B>, activation: Activation) -> Self {
        let activation = match activation {
            Activation::Identity => None,
            Activation::LeakyRelu { negative_slope } => Some(
                LeakyReluConfig::new()
                    .with_negative_slope(negative_slope)
                    .init(),
            ),
        };
        Self { dense, activation }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.dense.forward(x);
        match &self.activation {
            Some(act) => act.forward(x),
            None => x,
        }
    }

    pub fn dense(&self) -> &Dense<B> {
        &self.dense
    }
}

#[derive(Module, Debug)]
pub struct McepNet<B: Backend> {
    hidden: Vec<HiddenStage<B>>,
    projection: Dense<B>,
}

impl<B: Backend> McepNet<B> {
    /// Sample every parameter from `rng`: hidden kernels in order, then
    /// the projection. The spec must already be validated.
    pub fn from_spec(spec: &NetworkSpec, rng: &mut StdRng, device: &B::Device) -> Self {
        let mut d_in = spec.input_size;
        let mut hidden = Vec::with_capacity(spec.hidden.len());
        for layer in &spec.hidden {
            let dense = Dense::glorot(d_in, layer.width, rng, device);
            hidden.push(HiddenStage::new(dense, layer.activation));
            d_in = layer.width;
        }
        let projection = Dense::normal(d_in, spec.output_size, spec.projection_stddev, rng, device);

        Self { hidden, projection }
    }

    /// Same structure as `from_spec` with every parameter zeroed, used as
    /// the target of a record load.
    pub fn skeleton(spec: &NetworkSpec, device: &B::Device) -> Self {
        let mut d_in = spec.input_size;
        let mut hidden = Vec::with_capacity(spec.hidden.len());
        for layer in &spec.hidden {
            hidden.push(HiddenStage::new(Dense::zeros(d_in, layer.width, device), layer.activation));
            d_in = layer.width;
        }
        Self {
            hidden,
            projection: Dense::zeros(d_in, spec.output_size, device),
        }
    }

    pub fn input_size(&self) -> usize {
        self.hidden
            .first()
            .map(|s| s.dense.d_input())
            .unwrap_or_else(|| self.projection.d_input())
    }

    pub fn output_size(&self) -> usize {
        self.projection.d_output()
    }

    pub fn hidden(&self) -> &[HiddenStage<B>] {
        &self.hidden
    }

    pub fn projection(&self) -> &Dense<B> {
        &self.projection
    }

    /// Forward pass. Panics inside the backend on a width mismatch; use
    /// `convert` for checked input.
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let mut h = x.clone();
        for stage in &self.hidden {
            h = stage.forward(h);
        }
        self.projection.forward(h) + x
    }

    pub fn convert(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        let [_, width] = x.dims();
        if width != self.input_size() {
            return Err(McepError::shape(INPUT_X, self.input_size(), width));
        }
        Ok(self.forward(x))
    }

    /// Every parameter, flattened stage by stage
    pub fn parameter_values(&self) -> Result<Vec<f32>> {
        let mut out = Vec::new();
        for stage in &self.hidden {
            out.extend(stage.dense.values()?);
        }
        out.extend(self.projection.values()?);
        Ok(out)
    }
}
