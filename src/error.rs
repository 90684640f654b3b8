use std::path::PathBuf;

use thiserror::Error;

/// Main error type for network construction and export
#[derive(Error, Debug)]
pub enum McepError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid network spec: {0}")]
    InvalidSpec(String),

    // Shape errors
    #[error("Shape mismatch for {tensor}: expected {expected}, got {actual}")]
    ShapeMismatch {
        tensor: String,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid learning rate: {0}")]
    InvalidLearningRate(f64),

    // Export errors
    #[error("Export directory already exists: {}", .0.display())]
    ExportExists(PathBuf),

    #[error("Export not found: {}", .0.display())]
    ExportNotFound(PathBuf),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Model record error: {0}")]
    Record(String),

    #[error("Tensor data error: {0}")]
    TensorData(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl McepError {
    pub fn shape(tensor: &str, expected: usize, actual: usize) -> Self {
        McepError::ShapeMismatch {
            tensor: tensor.to_string(),
            expected,
            actual,
        }
    }
}

impl From<burn::record::RecorderError> for McepError {
    fn from(err: burn::record::RecorderError) -> Self {
        McepError::Record(err.to_string())
    }
}

/// Result type alias for McepError
pub type Result<T> = std::result::Result<T, McepError>;
