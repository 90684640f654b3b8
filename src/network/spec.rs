//! Declarative network description.
//!
//! A `NetworkSpec` lists the hidden stages as (width, activation) pairs
//! and carries everything else needed to rebuild the same parameters:
//! sizes, seed, projection init and the loss. It is embedded verbatim in
//! every exported signature.

use serde::{Deserialize, Serialize};

use crate::error::{McepError, Result};
use crate::loss::LossStrategy;
use crate::variant::{
    ModelVariant, HIDDEN_LAYERS, HIDDEN_SIZE, LEAKY_RELU_SLOPE, PROJECTION_STDDEV, SEED,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Activation {
    Identity,
    LeakyRelu { negative_slope: f64 },
}

impl Default for Activation {
    fn default() -> Self {
        Self::Identity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub width: usize,
    #[serde(default)]
    pub activation: Activation,
}

impl LayerSpec {
    pub fn leaky(width: usize) -> Self {
        Self {
            width,
            activation: Activation::LeakyRelu {
                negative_slope: LEAKY_RELU_SLOPE,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_size: usize,
    pub output_size: usize,
    pub hidden: Vec<LayerSpec>,
    /// Stddev of the normal draw for the final projection weights
    pub projection_stddev: f64,
    pub seed: u64,
    pub loss: LossStrategy,
}

impl NetworkSpec {
    /// The fixed architecture: three leaky 500-wide stages, seed 1.
    pub fn for_variant(variant: ModelVariant) -> Self {
        Self {
            input_size: variant.input_size(),
            output_size: variant.output_size(),
            hidden: vec![LayerSpec::leaky(HIDDEN_SIZE); HIDDEN_LAYERS],
            projection_stddev: PROJECTION_STDDEV,
            seed: SEED,
            loss: variant.default_loss(),
        }
    }

    pub fn with_loss(mut self, loss: LossStrategy) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Width feeding the final projection
    pub fn last_hidden_width(&self) -> usize {
        self.hidden
            .last()
            .map(|l| l.width)
            .unwrap_or(self.input_size)
    }

    pub fn validate(&self) -> Result<()> {
        // The residual add is only well-typed with equal widths.
        if self.input_size != self.output_size {
            return Err(McepError::shape("Converted", self.input_size, self.output_size));
        }
        if self.input_size == 0 {
            return Err(McepError::InvalidSpec("input_size must be > 0".to_string()));
        }
        if self.hidden.is_empty() {
            return Err(McepError::InvalidSpec(
                "at least one hidden layer is required".to_string(),
            ));
        }
        for (idx, layer) in self.hidden.iter().enumerate() {
            if layer.width == 0 {
                return Err(McepError::InvalidSpec(format!(
                    "hidden[{idx}] width must be > 0"
                )));
            }
            if let Activation::LeakyRelu { negative_slope } = layer.activation {
                if !negative_slope.is_finite() || negative_slope < 0.0 {
                    return Err(McepError::InvalidSpec(format!(
                        "hidden[{idx}] negative_slope must be finite and >= 0"
                    )));
                }
            }
        }
        if !self.projection_stddev.is_finite() || self.projection_stddev < 0.0 {
            return Err(McepError::InvalidSpec(
                "projection_stddev must be finite and >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_spec() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep177);
        assert_eq!(spec.input_size, 177);
        assert_eq!(spec.output_size, 177);
        assert_eq!(spec.hidden.len(), 3);
        assert!(spec.hidden.iter().all(|l| l.width == 500));
        assert_eq!(spec.seed, 1);
        assert_eq!(spec.loss, LossStrategy::HalfSumSquares);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_mismatched_sizes_rejected() {
        let mut spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        spec.output_size = 41;

        match spec.validate() {
            Err(McepError::ShapeMismatch { expected, actual, .. }) => {
                assert_eq!(expected, 40);
                assert_eq!(actual, 41);
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_layers_rejected() {
        let mut spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        spec.hidden[1].width = 0;
        assert!(matches!(spec.validate(), Err(McepError::InvalidSpec(_))));

        let mut spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        spec.hidden.clear();
        assert!(matches!(spec.validate(), Err(McepError::InvalidSpec(_))));

        let mut spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        spec.projection_stddev = f64::NAN;
        assert!(matches!(spec.validate(), Err(McepError::InvalidSpec(_))));
    }

    #[test]
    fn test_spec_json_roundtrip() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        let json = serde_json::to_string(&spec).unwrap();
        assert!(json.contains("\"leaky_relu\""));
        assert!(json.contains("\"mse\""));

        let back: NetworkSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
