use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

use crate::export::ExportedModel;
use crate::InferenceBackend;

pub fn run(dir: &Path) -> Result<()> {
    let device = Default::default();
    let model = ExportedModel::<InferenceBackend>::load(dir, &device)
        .with_context(|| format!("Failed to load export from {}", dir.display()))?;
    let signature = model.signature();

    println!("Export {}", dir.display());
    println!("  producer:    {}", signature.producer);
    println!("  exported at: {}", signature.exported_at.to_rfc3339());
    println!("  parameters:  {}", signature.parameter_count);
    println!(
        "  trained:     {} ({} optimizer steps)",
        signature.trained, signature.optimizer_steps
    );
    println!(
        "  hidden:      {:?}",
        signature.spec.hidden.iter().map(|l| l.width).collect::<Vec<_>>()
    );
    println!("  seed:        {}", signature.spec.seed);
    println!(
        "  operations:  {} / {} (lr input: {})",
        signature.operations.loss, signature.operations.optimizer, signature.operations.learning_rate
    );
    for (name, binding) in &signature.inputs {
        println!("  input  {:<10} {} {:?}", name, binding.dtype, binding.shape);
    }
    for (name, binding) in &signature.outputs {
        println!("  output {:<10} {} {:?}", name, binding.dtype, binding.shape);
    }

    let probe = vec![vec![0.0f32; signature.spec.input_size]];
    let converted = model.convert_rows(&probe).context("Zero-vector probe failed")?;
    let max_abs = converted
        .iter()
        .flatten()
        .fold(0.0f32, |acc, v| acc.max(v.abs()));
    println!("  zero probe:  max |Converted| = {:.3e}", max_abs);
    if max_abs != 0.0 && !signature.trained {
        warn!("Zero input did not map to zero output; biases are non-zero");
    }
    Ok(())
}
