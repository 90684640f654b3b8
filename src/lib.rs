//! Residual mel-cepstral regression network.
//!
//! Declares a three-stage dense network whose output is added back onto
//! its input, the loss and Adam operations bound to it, and exports the
//! freshly initialized parameters with named `X`/`Y` -> `Converted`
//! bindings.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod graph;
pub mod loss;
pub mod network;
pub mod optimizer;
pub mod variant;

pub use config::AppConfig;
pub use error::{McepError, Result};
pub use export::{ExportedModel, Signature};
pub use graph::{export_variant, ExportSummary, GraphBuilder, McepGraph};
pub use loss::LossStrategy;
pub use network::{Activation, LayerSpec, McepNet, NetworkSpec};
pub use optimizer::{AdamSettings, AdamStep};
pub use variant::ModelVariant;

/// CPU backend used by the binary and for loading exports
pub type InferenceBackend = burn_ndarray::NdArray<f32>;

/// Autodiff backend the graph is built on
pub type GraphBackend = burn::backend::Autodiff<InferenceBackend>;
