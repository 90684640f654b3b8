//! Model Variants
//!
//! The two mcep feature layouts the network is built for. Sizes are fixed
//! per variant; only the variant itself is chosen at runtime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::loss::LossStrategy;

/// Width of every hidden stage
pub const HIDDEN_SIZE: usize = 500;

/// Number of hidden dense stages
pub const HIDDEN_LAYERS: usize = 3;

/// Seed for parameter initialization
pub const SEED: u64 = 1;

/// Standard deviation of the final projection weights
pub const PROJECTION_STDDEV: f64 = 0.1;

/// Negative slope of the hidden activations
pub const LEAKY_RELU_SLOPE: f64 = 0.2;

/// Where the export lands when nothing else is configured
pub const DEFAULT_EXPORT_DIR: &str = "../Models/McepNN/model";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelVariant {
    /// 40 mel-cepstral coefficients per frame
    Mcep40,
    /// 177 coefficients per frame
    Mcep177,
}

impl ModelVariant {
    pub const ALL: [ModelVariant; 2] = [ModelVariant::Mcep40, ModelVariant::Mcep177];

    pub fn input_size(&self) -> usize {
        match self {
            ModelVariant::Mcep40 => 40,
            ModelVariant::Mcep177 => 177,
        }
    }

    /// Always equal to `input_size`: the network predicts a correction
    /// that is added back onto its input.
    pub fn output_size(&self) -> usize {
        self.input_size()
    }

    pub fn default_loss(&self) -> LossStrategy {
        match self {
            ModelVariant::Mcep40 => LossStrategy::MeanSquared,
            ModelVariant::Mcep177 => LossStrategy::HalfSumSquares,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Mcep40 => "mcep40",
            ModelVariant::Mcep177 => "mcep177",
        }
    }
}

impl Default for ModelVariant {
    fn default() -> Self {
        ModelVariant::Mcep40
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcep40" | "40" => Ok(ModelVariant::Mcep40),
            "mcep177" | "177" => Ok(ModelVariant::Mcep177),
            other => Err(format!(
                "unknown variant '{}', expected one of: mcep40, mcep177",
                other
            )),
        }
    }
}
