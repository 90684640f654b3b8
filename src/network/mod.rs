//! Network Definition
//!
//! Declarative spec, dense stages and the residual regression module.

pub mod dense;
pub mod model;
pub mod rows;
pub mod spec;

pub use dense::Dense;
pub use model::{HiddenStage, McepNet, INPUT_X, INPUT_Y, OUTPUT_CONVERTED};
pub use rows::{rows_to_tensor, tensor_to_rows};
pub use spec::{Activation, LayerSpec, NetworkSpec};
