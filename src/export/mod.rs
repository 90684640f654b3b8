//! Model Export
//!
//! An export is a directory holding:
//!
//! - `signature.json`: named input/output bindings and the network spec
//! - `variables.mpk`: the parameter record (named MessagePack, full precision)
//!
//! Exports are written once. A directory that already exists is never
//! overwritten, and files are staged next to the target and renamed into
//! place so a failed write leaves nothing at the target path.

pub mod signature;

use std::fs;
use std::path::{Path, PathBuf};

use burn::prelude::*;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{McepError, Result};
use crate::network::{rows_to_tensor, tensor_to_rows, McepNet, NetworkSpec, INPUT_X};

pub use signature::{Signature, TensorBinding, SIGNATURE_FILE};

/// Record file stem; the recorder appends `.mpk`
pub const VARIABLES_FILE: &str = "variables";

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

/// Write `model` and its signature to `dir`. `steps` is the number of
/// optimizer updates applied to `model` since initialization.
pub fn write<B: Backend>(
    dir: &Path,
    spec: &NetworkSpec,
    model: &McepNet<B>,
    steps: usize,
) -> Result<Signature> {
    if dir.exists() {
        return Err(McepError::ExportExists(dir.to_path_buf()));
    }

    let parent = match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let stem = dir
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("model");
    let staging = parent.join(format!(".{}.staging-{}", stem, Uuid::new_v4()));
    fs::create_dir_all(&staging)?;
    debug!("Staging export in {:?}", staging);

    let signature = match write_into(&staging, spec, model, steps) {
        Ok(signature) => signature,
        Err(e) => {
            discard(&staging);
            return Err(e);
        }
    };

    // Re-check: another writer may have claimed the target meanwhile.
    if dir.exists() {
        discard(&staging);
        return Err(McepError::ExportExists(dir.to_path_buf()));
    }
    if let Err(e) = fs::rename(&staging, dir) {
        discard(&staging);
        return Err(e.into());
    }

    info!(
        "Exported {} parameters to {:?} (inputs: X[-1,{}], Y[-1,{}] -> Converted[-1,{}])",
        signature.parameter_count, dir, spec.input_size, spec.output_size, spec.output_size
    );
    Ok(signature)
}

fn write_into<B: Backend>(
    staging: &Path,
    spec: &NetworkSpec,
    model: &McepNet<B>,
    steps: usize,
) -> Result<Signature> {
    let signature = Signature::new(spec.clone(), model.num_params()).with_optimizer_steps(steps);
    signature.write(staging)?;

    model
        .clone()
        .save_file(staging.join(VARIABLES_FILE), &recorder())?;

    Ok(signature)
}

fn discard(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging) {
        warn!("Failed to remove staging directory {:?}: {}", staging, e);
    }
}

/// A reloaded export, ready for inference
#[derive(Debug)]
pub struct ExportedModel<B: Backend> {
    signature: Signature,
    model: McepNet<B>,
    device: B::Device,
}

impl<B: Backend> ExportedModel<B> {
    pub fn load<P: AsRef<Path>>(dir: P, device: &B::Device) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(McepError::ExportNotFound(dir.to_path_buf()));
        }

        let signature = Signature::read(dir)?;
        let model = McepNet::skeleton(&signature.spec, device).load_file(
            dir.join(VARIABLES_FILE),
            &recorder(),
            device,
        )?;

        if model.num_params() != signature.parameter_count {
            return Err(McepError::InvalidSignature(format!(
                "record holds {} parameters, signature declares {}",
                model.num_params(),
                signature.parameter_count
            )));
        }

        info!(
            "Loaded export {:?} ({}, {} parameters)",
            dir, signature.producer, signature.parameter_count
        );
        Ok(Self {
            signature,
            model,
            device: device.clone(),
        })
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn model(&self) -> &McepNet<B> {
        &self.model
    }

    pub fn convert(&self, x: Tensor<B, 2>) -> Result<Tensor<B, 2>> {
        self.model.convert(x)
    }

    pub fn convert_rows(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let x = rows_to_tensor::<B>(INPUT_X, rows, self.signature.spec.input_size, &self.device)?;
        tensor_to_rows(self.convert(x)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::LayerSpec;
    use crate::loss::LossStrategy;
    use burn_ndarray::NdArray;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    type TestBackend = NdArray<f32>;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("mcepnn-export-{}", Uuid::new_v4()))
            .join(name)
    }

    fn small_spec() -> NetworkSpec {
        NetworkSpec {
            input_size: 6,
            output_size: 6,
            hidden: vec![LayerSpec::leaky(12); 3],
            projection_stddev: 0.1,
            seed: 1,
            loss: LossStrategy::MeanSquared,
        }
    }

    fn small_net(spec: &NetworkSpec) -> McepNet<TestBackend> {
        McepNet::from_spec(spec, &mut StdRng::seed_from_u64(spec.seed), &Default::default())
    }

    #[test]
    fn test_write_layout() {
        let dir = scratch_dir("model");
        let spec = small_spec();
        let signature = write(&dir, &spec, &small_net(&spec), 0).unwrap();

        assert!(dir.join(SIGNATURE_FILE).is_file());
        assert!(dir.join("variables.mpk").is_file());
        assert_eq!(signature.parameter_count, small_net(&spec).num_params());

        // nothing but the target is left in the parent
        let siblings: Vec<_> = fs::read_dir(dir.parent().unwrap())
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(siblings.len(), 1);

        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn test_second_export_fails() {
        let dir = scratch_dir("model");
        let spec = small_spec();
        write(&dir, &spec, &small_net(&spec), 0).unwrap();

        match write(&dir, &spec, &small_net(&spec), 0) {
            Err(McepError::ExportExists(path)) => assert_eq!(path, dir),
            other => panic!("expected ExportExists, got {:?}", other.map(|s| s.producer)),
        }

        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn test_load_reproduces_output() {
        let dir = scratch_dir("model");
        let spec = small_spec();
        let net = small_net(&spec);
        write(&dir, &spec, &net, 0).unwrap();

        let loaded = ExportedModel::<TestBackend>::load(&dir, &Default::default()).unwrap();
        assert_eq!(loaded.signature().spec, spec);
        assert_eq!(
            loaded.model().parameter_values().unwrap(),
            net.parameter_values().unwrap()
        );

        let rows = vec![vec![0.5, -1.0, 2.0, 0.0, 3.5, -0.25]; 3];
        let x = rows_to_tensor::<TestBackend>(INPUT_X, &rows, 6, &Default::default()).unwrap();
        let expected = tensor_to_rows(net.forward(x)).unwrap();

        assert_eq!(loaded.convert_rows(&rows).unwrap(), expected);

        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }

    #[test]
    fn test_load_missing_export() {
        let dir = scratch_dir("absent");
        let err = ExportedModel::<TestBackend>::load(&dir, &Default::default()).unwrap_err();
        assert!(matches!(err, McepError::ExportNotFound(_)));
    }
}
