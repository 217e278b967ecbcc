use std::time::Duration;

use accelbench_backend_sim::SimBackend;
use accelbench_core::{
    Backend, BenchError, DType, Device, ModelArtifact, ModelHandle, Shape, SimProfile, Stage,
    Tensor,
};
use anyhow::Result;

fn mnist() -> ModelArtifact {
    ModelArtifact::Simulated(SimProfile::mnist_int8().with_latency(Duration::ZERO))
}

#[test]
fn loads_mnist_contract() -> Result<()> {
    let backend = SimBackend::new();
    assert_eq!(backend.name(), "sim");
    let model = backend.load(&mnist(), &Device::Cpu)?;

    assert_eq!(model.describe_inputs().len(), 1);
    assert_eq!(model.describe_outputs().len(), 1);
    assert_eq!(model.describe_inputs()[0].dtype, DType::I8);
    assert_eq!(model.describe_inputs()[0].shape.dims(), &[1, 28, 28, 1]);
    assert_eq!(model.describe_outputs()[0].shape.dims(), &[1, 10]);
    Ok(())
}

#[test]
fn rejects_foreign_artifacts() {
    let err = SimBackend::new()
        .load(&ModelArtifact::OnnxPath("mnist.onnx".into()), &Device::Cpu)
        .err()
        .expect("onnx artifact must be rejected");
    assert!(matches!(err, BenchError::ModelLoad { .. }));
}

#[test]
fn bind_execute_read() -> Result<()> {
    let mut model = SimBackend::new().load(&mnist(), &Device::Cpu)?;

    assert!(matches!(
        model.read_output(0),
        Err(BenchError::State {
            stage: Stage::ReadOutput,
            ..
        })
    ));

    model.bind(0, Tensor::zeros(DType::I8, Shape::from_slice(&[1, 28, 28, 1])))?;
    model.execute()?;
    let out = model.read_output(0)?;
    assert_eq!(out.dtype, DType::I8);
    assert_eq!(out.element_count(), 10);
    assert_eq!(out.argmax(), Some(9));
    assert_eq!(model.executions(), 1);
    Ok(())
}

#[test]
fn injected_fault_blocks_output() -> Result<()> {
    let profile = SimProfile::mnist_int8()
        .with_latency(Duration::ZERO)
        .failing_on(2);
    let mut model = SimBackend::new().load(&ModelArtifact::Simulated(profile), &Device::Cpu)?;
    model.bind(0, Tensor::zeros(DType::I8, Shape::from_slice(&[1, 28, 28, 1])))?;

    model.execute()?;
    let err = model.execute().unwrap_err();
    assert!(matches!(err, BenchError::Execution { iteration: 2, .. }));
    assert!(model.read_output(0).is_err());

    model.execute()?;
    assert!(model.read_output(0).is_ok());
    Ok(())
}

#[test]
fn zero_sized_slot_fails_to_load() {
    let mut profile = SimProfile::mnist_int8();
    profile.outputs = vec![accelbench_core::TensorDescriptor::new(
        "scores",
        0,
        DType::I8,
        &[1, 0],
    )];

    let err = SimBackend::new()
        .load(&ModelArtifact::Simulated(profile), &Device::Cpu)
        .err()
        .expect("empty output slot must not load");
    match err {
        BenchError::ModelLoad { reason, .. } => assert!(reason.contains("zero-sized"), "{reason}"),
        other => panic!("unexpected error: {other}"),
    }
}
