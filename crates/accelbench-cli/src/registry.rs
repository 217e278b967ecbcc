use std::path::PathBuf;

use accelbench_backend_openvino::OpenVinoBackend;
use accelbench_backend_ort::OrtBackend;
use accelbench_backend_sim::SimBackend;
use accelbench_core::{Backend, Device, ModelArtifact, ModelHandle, SimProfile};
use anyhow::{bail, Result};
use clap::ValueEnum;
use serde::Deserialize;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// ONNX Runtime
    Onnx,
    /// OpenVINO IR (.xml + .bin)
    #[value(name = "openvino")]
    #[serde(rename = "openvino")]
    OpenVino,
    /// In-process simulated accelerator
    Sim,
}

pub type LoadedModel = Box<dyn ModelHandle>;

/// Resolves the artifact for `kind` and loads it onto `device`.
pub fn load(
    kind: BackendKind,
    model: Option<PathBuf>,
    weights: Option<PathBuf>,
    device: &Device,
) -> Result<LoadedModel> {
    let loaded: LoadedModel = match kind {
        BackendKind::Onnx => {
            let Some(path) = model else {
                bail!("--model is required for the onnx backend");
            };
            load_with(OrtBackend::new(), &ModelArtifact::OnnxPath(path), device)?
        }
        BackendKind::OpenVino => {
            let Some(descriptor) = model else {
                bail!("--model is required for the openvino backend");
            };
            let artifact = match weights {
                Some(weights) => ModelArtifact::OpenVinoIr {
                    descriptor,
                    weights,
                },
                None => ModelArtifact::openvino_ir(descriptor),
            };
            load_with(OpenVinoBackend::new(), &artifact, device)?
        }
        BackendKind::Sim => {
            let artifact = ModelArtifact::Simulated(SimProfile::mnist_int8());
            load_with(SimBackend::new(), &artifact, device)?
        }
    };
    Ok(loaded)
}

fn load_with<B>(backend: B, artifact: &ModelArtifact, device: &Device) -> Result<LoadedModel>
where
    B: Backend,
    B::Model: 'static,
{
    info!(backend = backend.name(), %artifact, %device, "loading model");
    Ok(Box::new(backend.load(artifact, device)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_needs_no_model_file() {
        let model = load(BackendKind::Sim, None, None, &Device::Cpu).unwrap();
        assert_eq!(model.describe_inputs().len(), 1);
    }

    #[test]
    fn onnx_without_model_fails() {
        let err = load(BackendKind::Onnx, None, None, &Device::Cpu)
            .err()
            .expect("model required");
        assert!(err.to_string().contains("--model"));
    }
}
