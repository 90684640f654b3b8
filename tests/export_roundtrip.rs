use std::fs;
use std::path::PathBuf;

use mcepnn::{
    export_variant, ExportedModel, GraphBackend, GraphBuilder, InferenceBackend, LossStrategy,
    McepError, ModelVariant,
};

fn scratch_root() -> PathBuf {
    std::env::temp_dir().join(format!("mcepnn-it-{}", uuid::Uuid::new_v4()))
}

fn frames(width: usize) -> Vec<Vec<f32>> {
    (0..4)
        .map(|r| {
            (0..width)
                .map(|c| ((r * width + c) as f32 * 0.37).sin())
                .collect()
        })
        .collect()
}

/// A reloaded export must reproduce the `Converted` of the graph it came from.
#[test]
fn exported_model_reproduces_in_process_output() {
    let root = scratch_root();
    let dir = root.join("Models").join("McepNN").join("model");
    let device = Default::default();

    let graph = GraphBuilder::for_variant(ModelVariant::Mcep40)
        .build::<GraphBackend>(&device)
        .unwrap();
    let signature = graph.export(&dir).expect("export should succeed");
    assert_eq!(signature.spec.loss, LossStrategy::MeanSquared);
    assert!(!signature.trained);

    let input = frames(40);
    let expected = graph.convert_rows(&input).unwrap();
    graph.close();

    let loaded = ExportedModel::<InferenceBackend>::load(&dir, &Default::default()).unwrap();
    let actual = loaded.convert_rows(&input).unwrap();

    assert_eq!(actual.len(), expected.len());
    for (a_row, e_row) in actual.iter().zip(expected.iter()) {
        assert_eq!(a_row.len(), 40);
        for (a, e) in a_row.iter().zip(e_row.iter()) {
            assert!((a - e).abs() < 1e-5, "reloaded {} != in-process {}", a, e);
        }
    }

    fs::remove_dir_all(&root).ok();
}

/// The export path is never overwritten.
#[test]
fn exporting_twice_to_same_path_fails() {
    let root = scratch_root();
    let dir = root.join("model");
    let device = Default::default();

    export_variant::<GraphBackend>(ModelVariant::Mcep40, None, &dir, &device).unwrap();
    let err = export_variant::<GraphBackend>(ModelVariant::Mcep40, None, &dir, &device)
        .expect_err("second export must fail");
    assert!(matches!(err, McepError::ExportExists(_)), "got {err}");

    // The first export is still intact.
    assert!(ExportedModel::<InferenceBackend>::load(&dir, &Default::default()).is_ok());

    fs::remove_dir_all(&root).ok();
}

/// Variant B exports 177-wide bindings and the half-sum loss by default.
#[test]
fn wide_variant_signature() {
    let root = scratch_root();
    let dir = root.join("model177");
    let device = Default::default();

    let summary =
        export_variant::<GraphBackend>(ModelVariant::Mcep177, None, &dir, &device).unwrap();
    let signature = &summary.signature;

    assert_eq!(signature.input_width(), Some(177));
    assert_eq!(signature.output_width(), Some(177));
    assert_eq!(signature.spec.loss, LossStrategy::HalfSumSquares);
    assert_eq!(signature.operations.optimizer, "Optimizer");

    let loaded = ExportedModel::<InferenceBackend>::load(&dir, &Default::default()).unwrap();
    let err = loaded
        .convert_rows(&[vec![0.0; 40]])
        .expect_err("40-wide frame must be rejected");
    assert!(matches!(
        err,
        McepError::ShapeMismatch {
            expected: 177,
            actual: 40,
            ..
        }
    ));

    let zeros = loaded.convert_rows(&[vec![0.0; 177]]).unwrap();
    assert_eq!(zeros, vec![vec![0.0; 177]]);

    fs::remove_dir_all(&root).ok();
}

/// Loss override is recorded in the signature.
#[test]
fn loss_override_is_exported() {
    let root = scratch_root();
    let dir = root.join("model");
    let device = Default::default();

    let summary = export_variant::<GraphBackend>(
        ModelVariant::Mcep40,
        Some(LossStrategy::HalfSumSquares),
        &dir,
        &device,
    )
    .unwrap();
    assert_eq!(summary.signature.spec.loss, LossStrategy::HalfSumSquares);

    let loaded = ExportedModel::<InferenceBackend>::load(&dir, &Default::default()).unwrap();
    assert_eq!(loaded.signature().spec.loss, LossStrategy::HalfSumSquares);

    fs::remove_dir_all(&root).ok();
}
