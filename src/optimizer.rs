//! Adam Optimizer Operation
//!
//! One optimizer step bound to the network's loss. The learning rate is
//! an argument of every call and never part of the optimizer state.

use burn::optim::adaptor::OptimizerAdaptor;
use burn::optim::{Adam, AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{McepError, Result};
use crate::loss::LossStrategy;
use crate::network::dense::to_vec;
use crate::network::{McepNet, INPUT_Y};

/// Name of the optimizer operation in an exported signature
pub const OPTIMIZER_OP: &str = "Optimizer";

/// Name of the learning-rate input
pub const LEARNING_RATE: &str = "learning_rate";

/// Adam hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdamSettings {
    pub beta_1: f32,
    pub beta_2: f32,
    pub epsilon: f32,
}

impl Default for AdamSettings {
    fn default() -> Self {
        Self {
            beta_1: 0.9,
            beta_2: 0.999,
            epsilon: 1e-8,
        }
    }
}

impl AdamSettings {
    pub fn config(&self) -> AdamConfig {
        AdamConfig::new()
            .with_beta_1(self.beta_1)
            .with_beta_2(self.beta_2)
            .with_epsilon(self.epsilon)
    }
}

/// Adam state for one network plus the loss it minimizes
pub struct AdamStep<B: AutodiffBackend> {
    optim: OptimizerAdaptor<Adam<B::InnerBackend>, McepNet<B>, B>,
    loss: LossStrategy,
    settings: AdamSettings,
    steps: usize,
}

impl<B: AutodiffBackend> AdamStep<B> {
    pub fn new(loss: LossStrategy) -> Self {
        Self::with_settings(loss, AdamSettings::default())
    }

    pub fn with_settings(loss: LossStrategy, settings: AdamSettings) -> Self {
        Self {
            optim: settings.config().init::<B, McepNet<B>>(),
            loss,
            settings,
            steps: 0,
        }
    }

    pub fn loss(&self) -> LossStrategy {
        self.loss
    }

    pub fn settings(&self) -> AdamSettings {
        self.settings
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Forward, loss, backward and one parameter update over every
    /// trainable tensor. Returns the updated network and the loss
    /// measured before the update.
    pub fn step(
        &mut self,
        model: McepNet<B>,
        x: Tensor<B, 2>,
        y: Tensor<B, 2>,
        learning_rate: f64,
    ) -> Result<(McepNet<B>, f32)> {
        if !learning_rate.is_finite() || learning_rate < 0.0 {
            return Err(McepError::InvalidLearningRate(learning_rate));
        }
        let [_, y_width] = y.dims();
        if y_width != model.output_size() {
            return Err(McepError::shape(INPUT_Y, model.output_size(), y_width));
        }

        let converted = model.convert(x)?;
        let loss = self.loss.compute(converted, y);
        let loss_value = scalar(loss.clone().into_data())?;

        let grads = loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);
        let model = self.optim.step(learning_rate, model, grads);
        self.steps += 1;

        debug!(
            step = self.steps,
            loss = loss_value,
            learning_rate,
            "optimizer step"
        );
        Ok((model, loss_value))
    }
}

pub(crate) fn scalar(data: TensorData) -> Result<f32> {
    to_vec(data)?
        .into_iter()
        .next()
        .ok_or_else(|| McepError::TensorData("empty scalar tensor".to_string()))
}
