//! Graph Construction and Lifecycle
//!
//! `GraphBuilder` turns a `NetworkSpec` into a `McepGraph`: parameters
//! sampled once from the spec's seed, the loss and the Adam operation
//! bound to them. The graph is then exported and closed.
//!
//! ```text
//! GraphBuilder::new(spec) --build--> McepGraph --export--> dir
//!                                        |
//!                                        +--close/drop--> released
//! ```

use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, instrument};

use crate::error::{McepError, Result};
use crate::export::{self, Signature};
use crate::loss::LossStrategy;
use crate::network::{rows_to_tensor, tensor_to_rows, McepNet, NetworkSpec, INPUT_X, INPUT_Y};
use crate::optimizer::{scalar, AdamStep};
use crate::variant::ModelVariant;

#[derive(Debug, Clone)]
pub struct GraphBuilder {
    spec: NetworkSpec,
}

impl GraphBuilder {
    pub fn new(spec: NetworkSpec) -> Self {
        Self { spec }
    }

    pub fn for_variant(variant: ModelVariant) -> Self {
        Self::new(NetworkSpec::for_variant(variant))
    }

    pub fn with_loss(mut self, loss: LossStrategy) -> Self {
        self.spec.loss = loss;
        self
    }

    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    /// Validate the spec, then construct and initialize every parameter.
    /// Size mismatches fail here, before any forward pass.
    pub fn build<B: AutodiffBackend>(self, device: &B::Device) -> Result<McepGraph<B>> {
        self.spec.validate()?;

        let mut rng = StdRng::seed_from_u64(self.spec.seed);
        let model = McepNet::from_spec(&self.spec, &mut rng, device);
        let optimizer = AdamStep::new(self.spec.loss);

        info!(
            "Initialized network {} -> {:?} -> {} ({} parameters, seed {}, loss {})",
            self.spec.input_size,
            self.spec.hidden.iter().map(|l| l.width).collect::<Vec<_>>(),
            self.spec.output_size,
            model.num_params(),
            self.spec.seed,
            self.spec.loss
        );

        Ok(McepGraph {
            spec: self.spec,
            model,
            optimizer,
            device: device.clone(),
        })
    }
}

/// An initialized network with its loss and optimizer operations
pub struct McepGraph<B: AutodiffBackend> {
    spec: NetworkSpec,
    model: McepNet<B>,
    optimizer: AdamStep<B>,
    device: B::Device,
}

impl<B: AutodiffBackend> McepGraph<B> {
    pub fn spec(&self) -> &NetworkSpec {
        &self.spec
    }

    pub fn model(&self) -> &McepNet<B> {
        &self.model
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn steps(&self) -> usize {
        self.optimizer.steps()
    }

    /// `Converted` for a `[batch, input_size]` batch
    pub fn convert(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.model.convert(x)
    }

    pub fn convert_rows(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = rows_to_tensor::<B>(INPUT_X, rows, self.spec.input_size, &self.device)?;
        tensor_to_rows(self.convert(x)?)
    }

    /// Value of the `Loss` operation
    pub fn loss(&self, x: Tensor<B, 2>, y: Tensor<B, 2>) -> Result<f32> {
        let [_, y_width] = y.dims();
        if y_width != self.spec.output_size {
            return Err(McepError::shape(INPUT_Y, self.spec.output_size, y_width));
        }
        let converted = self.convert(x)?;
        scalar(self.spec.loss.compute(converted, y).into_data())
    }

    /// Run the `Optimizer` operation once with the given learning rate.
    /// Returns the loss measured before the update.
    pub fn optimize(&mut self, x: Tensor<B, 2>, y: Tensor<B, 2>, learning_rate: f64) -> Result<f32> {
        let (model, loss) = self
            .optimizer
            .step(self.model.clone(), x, y, learning_rate)?;
        self.model = model;
        Ok(loss)
    }

    /// Write the current parameters and signature to `dir`.
    #[instrument(skip(self), fields(input_size = self.spec.input_size))]
    pub fn export(&self, dir: &Path) -> Result<Signature> {
        let steps = self.optimizer.steps();
        if steps > 0 {
            debug!("Exporting after {} optimizer steps", steps);
        }
        export::write(dir, &self.spec, &self.model, steps)
    }

    /// Release the graph. Dropping has the same effect.
    pub fn close(self) {}
}

impl<B: AutodiffBackend> Drop for McepGraph<B> {
    fn drop(&mut self) {
        debug!(
            "Released graph ({} -> {}, {} optimizer steps)",
            self.spec.input_size,
            self.spec.output_size,
            self.optimizer.steps()
        );
    }
}

/// Summary of a one-shot export
#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub dir: PathBuf,
    pub variant: ModelVariant,
    pub signature: Signature,
}

/// Build, initialize, export and close in one call. The graph is
/// released whether or not the export succeeds.
pub fn export_variant<B: AutodiffBackend>(
    variant: ModelVariant,
    loss: Option<LossStrategy>,
    dir: &Path,
    device: &B::Device,
) -> Result<ExportSummary> {
    let loss = loss.unwrap_or_else(|| variant.default_loss());
    let graph = GraphBuilder::for_variant(variant)
        .with_loss(loss)
        .build::<B>(device)?;

    let result = graph.export(dir);
    graph.close();

    Ok(ExportSummary {
        dir: dir.to_path_buf(),
        variant,
        signature: result?,
    })
}
