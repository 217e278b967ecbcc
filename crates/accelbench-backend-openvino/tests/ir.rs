use std::path::PathBuf;

use accelbench_backend_openvino::OpenVinoBackend;
use accelbench_core::{Backend, BenchError, DType, Device, ModelArtifact, ModelHandle, Tensor};
use anyhow::{Context, Result};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../models")
        .join(name)
}

#[test]
fn missing_weights_is_load_error() {
    let artifact = ModelArtifact::OpenVinoIr {
        descriptor: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml"),
        weights: fixture("absent.bin"),
    };
    let err = OpenVinoBackend::new()
        .load(&artifact, &Device::Named("MYRIAD".into()))
        .err()
        .expect("missing weights must not load");
    match err {
        BenchError::ModelLoad { reason, .. } => assert!(reason.contains("absent.bin"), "{reason}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn onnx_artifact_is_rejected() {
    let err = OpenVinoBackend::new()
        .load(&ModelArtifact::OnnxPath("mnist.onnx".into()), &Device::Cpu)
        .err()
        .expect("onnx artifact must be rejected");
    assert!(matches!(err, BenchError::ModelLoad { .. }));
}

#[test]
fn mnist_ir_on_cpu() -> Result<()> {
    let descriptor = fixture("mnist.xml");
    if !descriptor.is_file() {
        eprintln!("skipping: {} not present", descriptor.display());
        return Ok(());
    }

    let mut model =
        OpenVinoBackend::new().load(&ModelArtifact::openvino_ir(descriptor), &Device::Cpu)?;
    let input = model
        .describe_inputs()
        .first()
        .context("missing model input")?
        .clone();

    let wrong = Tensor::zeros(DType::I64, input.shape.clone());
    if input.dtype != DType::I64 {
        assert!(matches!(
            model.bind(0, wrong),
            Err(BenchError::ShapeMismatch { .. })
        ));
    }

    model.bind(0, Tensor::zeros(input.dtype, input.shape.clone()))?;
    model.execute()?;
    let out = model.read_output(0)?;
    assert!(out.element_count() > 0);
    Ok(())
}
