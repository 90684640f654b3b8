//! Export signature manifest.
//!
//! Binds the named inputs (`X`, `Y`) and output (`Converted`) to shapes,
//! names the loss/optimizer/learning-rate operations, and embeds the
//! `NetworkSpec` the parameters were built from.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{McepError, Result};
use crate::loss::LOSS_OP;
use crate::network::{NetworkSpec, INPUT_X, INPUT_Y, OUTPUT_CONVERTED};
use crate::optimizer::{AdamSettings, LEARNING_RATE, OPTIMIZER_OP};

pub const SIGNATURE_FILE: &str = "signature.json";

pub const FORMAT_VERSION: u32 = 1;

/// Leading dimension of every bound tensor (any batch size)
pub const BATCH_DIM: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorBinding {
    pub dtype: String,
    pub shape: Vec<i64>,
}

impl TensorBinding {
    pub fn batch_of(width: usize) -> Self {
        Self {
            dtype: "f32".to_string(),
            shape: vec![BATCH_DIM, width as i64],
        }
    }

    pub fn width(&self) -> Option<usize> {
        match self.shape.as_slice() {
            [BATCH_DIM, w] if *w > 0 => Some(*w as usize),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operations {
    pub loss: String,
    pub optimizer: String,
    pub learning_rate: String,
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            loss: LOSS_OP.to_string(),
            optimizer: OPTIMIZER_OP.to_string(),
            learning_rate: LEARNING_RATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub format_version: u32,
    /// Crate name and version that wrote the export
    pub producer: String,
    pub exported_at: DateTime<Utc>,
    pub spec: NetworkSpec,
    pub inputs: BTreeMap<String, TensorBinding>,
    pub outputs: BTreeMap<String, TensorBinding>,
    pub operations: Operations,
    pub optimizer: AdamSettings,
    pub parameter_count: usize,
    /// Optimizer steps applied before the export
    #[serde(default)]
    pub optimizer_steps: usize,
    #[serde(default)]
    pub trained: bool,
}

impl Signature {
    pub fn new(spec: NetworkSpec, parameter_count: usize) -> Self {
        let mut inputs = BTreeMap::new();
        inputs.insert(INPUT_X.to_string(), TensorBinding::batch_of(spec.input_size));
        inputs.insert(INPUT_Y.to_string(), TensorBinding::batch_of(spec.output_size));

        let mut outputs = BTreeMap::new();
        outputs.insert(
            OUTPUT_CONVERTED.to_string(),
            TensorBinding::batch_of(spec.output_size),
        );

        Self {
            format_version: FORMAT_VERSION,
            producer: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            exported_at: Utc::now(),
            spec,
            inputs,
            outputs,
            operations: Operations::default(),
            optimizer: AdamSettings::default(),
            parameter_count,
            optimizer_steps: 0,
            trained: false,
        }
    }

    pub fn with_optimizer_steps(mut self, steps: usize) -> Self {
        self.optimizer_steps = steps;
        self.trained = steps > 0;
        self
    }

    pub fn read(dir: &Path) -> Result<Self> {
        let path = dir.join(SIGNATURE_FILE);
        if !path.exists() {
            return Err(McepError::ExportNotFound(path));
        }
        let content = std::fs::read_to_string(&path)?;
        let signature: Self = serde_json::from_str(&content)?;
        signature.validate()?;
        Ok(signature)
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(self)?;
        std::fs::write(dir.join(SIGNATURE_FILE), body)?;
        Ok(())
    }

    pub fn input_width(&self) -> Option<usize> {
        self.inputs.get(INPUT_X).and_then(TensorBinding::width)
    }

    pub fn output_width(&self) -> Option<usize> {
        self.outputs.get(OUTPUT_CONVERTED).and_then(TensorBinding::width)
    }

    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(McepError::InvalidSignature(format!(
                "unsupported format_version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        self.spec
            .validate()
            .map_err(|e| McepError::InvalidSignature(e.to_string()))?;

        let bindings = [
            (INPUT_X, self.inputs.get(INPUT_X), self.spec.input_size),
            (INPUT_Y, self.inputs.get(INPUT_Y), self.spec.output_size),
            (
                OUTPUT_CONVERTED,
                self.outputs.get(OUTPUT_CONVERTED),
                self.spec.output_size,
            ),
        ];
        for (name, binding, expected) in bindings {
            let binding = binding
                .ok_or_else(|| McepError::InvalidSignature(format!("missing binding {name}")))?;
            match binding.width() {
                Some(width) if width == expected => {}
                _ => {
                    return Err(McepError::InvalidSignature(format!(
                        "binding {name} has shape {:?}, expected [{BATCH_DIM}, {expected}]",
                        binding.shape
                    )))
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::ModelVariant;

    #[test]
    fn test_signature_bindings() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        let signature = Signature::new(spec, 541_540);

        assert_eq!(signature.input_width(), Some(40));
        assert_eq!(signature.output_width(), Some(40));
        assert_eq!(signature.inputs.len(), 2);
        assert_eq!(signature.outputs.len(), 1);
        assert_eq!(signature.operations.learning_rate, "learning_rate");
        assert!(!signature.trained);
        assert!(signature.validate().is_ok());
    }

    #[test]
    fn test_optimizer_steps_mark_trained() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        let signature = Signature::new(spec, 10).with_optimizer_steps(3);

        assert_eq!(signature.optimizer_steps, 3);
        assert!(signature.trained);
    }

    #[test]
    fn test_signature_json_roundtrip() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep177);
        let signature = Signature::new(spec, 10);

        let json = serde_json::to_string_pretty(&signature).unwrap();
        assert!(json.contains("\"Converted\""));
        assert!(json.contains("\"half_sum_squares\""));

        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, signature);
    }

    #[test]
    fn test_tampered_binding_rejected() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        let mut signature = Signature::new(spec, 10);
        signature
            .inputs
            .insert(INPUT_X.to_string(), TensorBinding::batch_of(177));

        assert!(matches!(
            signature.validate(),
            Err(McepError::InvalidSignature(_))
        ));

        signature.inputs.remove(INPUT_X);
        assert!(signature.validate().is_err());
    }

    #[test]
    fn test_future_version_rejected() {
        let spec = NetworkSpec::for_variant(ModelVariant::Mcep40);
        let mut signature = Signature::new(spec, 10);
        signature.format_version = FORMAT_VERSION + 1;

        assert!(signature.validate().is_err());
    }
}
