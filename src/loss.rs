//! Regression Losses
//!
//! Two non-equivalent losses over `Converted` and the target `Y`:
//!
//! - `MeanSquared`: `mean((Y - Converted)^2)`
//! - `HalfSumSquares`: `0.5 * sum((Converted - Y)^2)`
//!
//! They differ by a factor of `numel / 2`, so learning rates tuned for
//! one do not carry over to the other.

use std::fmt;
use std::str::FromStr;

use burn::nn::loss::{MseLoss, Reduction};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

/// Name of the loss operation in an exported signature
pub const LOSS_OP: &str = "Loss";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossStrategy {
    /// Mean squared error over every element
    #[serde(rename = "mse", alias = "mean_squared")]
    MeanSquared,
    /// Half of the summed squared error (L2 loss)
    HalfSumSquares,
}

impl LossStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LossStrategy::MeanSquared => "mse",
            LossStrategy::HalfSumSquares => "half_sum_squares",
        }
    }

    /// Scalar loss, returned as a one-element tensor
    pub fn compute<B: Backend>(&self, converted: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
        let mse = MseLoss::new();
        match self {
            LossStrategy::MeanSquared => mse.forward(converted, target, Reduction::Mean),
            LossStrategy::HalfSumSquares => mse
                .forward(converted, target, Reduction::Sum)
                .mul_scalar(0.5),
        }
    }
}

impl fmt::Display for LossStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LossStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mse" | "mean_squared" => Ok(LossStrategy::MeanSquared),
            "half_sum_squares" | "l2" => Ok(LossStrategy::HalfSumSquares),
            other => Err(format!(
                "unknown loss '{}', expected one of: mse, half_sum_squares",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    fn scalar(t: Tensor<TestBackend, 1>) -> f32 {
        t.into_data().to_vec::<f32>().unwrap()[0]
    }

    #[test]
    fn test_zero_residual_is_zero_for_both() {
        let device = Default::default();
        let y = Tensor::<TestBackend, 2>::from_floats([[0.5, -1.0, 2.0], [3.0, 0.0, -0.25]], &device);

        for strategy in [LossStrategy::MeanSquared, LossStrategy::HalfSumSquares] {
            let loss = scalar(strategy.compute(y.clone(), y.clone()));
            assert_eq!(loss, 0.0, "{} should vanish on Y == Converted", strategy);
        }
    }

    #[test]
    fn test_strategies_differ() {
        let device = Default::default();
        let converted = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &device);
        let target = Tensor::<TestBackend, 2>::zeros([2, 2], &device);

        // squared errors: 1 + 4 + 9 + 16 = 30 over 4 elements
        let mse = scalar(LossStrategy::MeanSquared.compute(converted.clone(), target.clone()));
        let half = scalar(LossStrategy::HalfSumSquares.compute(converted, target));

        assert!((mse - 7.5).abs() < 1e-6, "mse = {}", mse);
        assert!((half - 15.0).abs() < 1e-6, "half sum = {}", half);
    }

    #[test]
    fn test_parse_loss() {
        assert_eq!("mse".parse::<LossStrategy>().unwrap(), LossStrategy::MeanSquared);
        assert_eq!(
            "half_sum_squares".parse::<LossStrategy>().unwrap(),
            LossStrategy::HalfSumSquares
        );
        assert!("huber".parse::<LossStrategy>().is_err());
    }
}
