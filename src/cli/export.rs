use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::graph::export_variant;
use crate::loss::LossStrategy;
use crate::variant::ModelVariant;
use crate::GraphBackend;

/// Resolved export parameters: CLI flags over configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRequest {
    pub variant: ModelVariant,
    pub loss: LossStrategy,
    pub dir: PathBuf,
}

impl ExportRequest {
    pub fn resolve(
        config: &AppConfig,
        variant: Option<ModelVariant>,
        loss: Option<LossStrategy>,
        out: Option<PathBuf>,
    ) -> Self {
        // A variant flag brings its own default loss; a configured loss
        // only applies to the configured variant.
        let (variant, loss) = match (variant, loss) {
            (Some(v), Some(l)) => (v, l),
            (Some(v), None) => (v, v.default_loss()),
            (None, Some(l)) => (config.network.variant, l),
            (None, None) => (config.network.variant, config.network.effective_loss()),
        };
        let dir = out.unwrap_or_else(|| config.export.dir.clone());
        Self { variant, loss, dir }
    }
}

pub fn run(request: ExportRequest) -> Result<()> {
    info!(
        "Exporting {} (loss {}) to {:?}",
        request.variant, request.loss, request.dir
    );

    let device = Default::default();
    let summary = export_variant::<GraphBackend>(
        request.variant,
        Some(request.loss),
        &request.dir,
        &device,
    )
    .with_context(|| format!("Failed to export model to {}", request.dir.display()))?;

    println!("Exported {} model", summary.variant);
    println!("  path:       {}", summary.dir.display());
    println!("  parameters: {}", summary.signature.parameter_count);
    println!("  loss:       {}", summary.signature.spec.loss);
    println!(
        "  signature:  X[-1,{}], Y[-1,{}] -> Converted[-1,{}]",
        summary.signature.spec.input_size,
        summary.signature.spec.output_size,
        summary.signature.spec.output_size
    );
    Ok(())
}
