use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::TensorDescriptor;

#[derive(Clone, Debug)]
pub enum ModelArtifact {
    OnnxPath(PathBuf),
    /// OpenVINO IR: topology descriptor plus its weights file.
    OpenVinoIr {
        descriptor: PathBuf,
        weights: PathBuf,
    },
    Simulated(SimProfile),
}

impl ModelArtifact {
    /// IR pair whose weights sit next to the descriptor with a `.bin` extension.
    pub fn openvino_ir(descriptor: impl Into<PathBuf>) -> Self {
        let descriptor = descriptor.into();
        let weights = descriptor.with_extension("bin");
        ModelArtifact::OpenVinoIr {
            descriptor,
            weights,
        }
    }
}

impl fmt::Display for ModelArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelArtifact::OnnxPath(path) => write!(f, "{}", path.display()),
            ModelArtifact::OpenVinoIr {
                descriptor,
                weights,
            } => write!(f, "{} (+{})", descriptor.display(), weights.display()),
            ModelArtifact::Simulated(profile) => write!(f, "simulated:{}", profile.name),
        }
    }
}

/// Contract and behaviour of the in-process simulated accelerator.
#[derive(Clone, Debug)]
pub struct SimProfile {
    pub name: String,
    pub inputs: Vec<TensorDescriptor>,
    pub outputs: Vec<TensorDescriptor>,
    /// Time each execute blocks for.
    pub latency: Duration,
    /// 1-based execute call that reports a device fault.
    pub fail_on_execute: Option<u64>,
}

impl SimProfile {
    /// Quantized MNIST classifier: one `[1, 28, 28, 1]` i8 input, ten i8 scores out.
    pub fn mnist_int8() -> Self {
        Self {
            name: "mnist-int8".to_string(),
            inputs: vec![TensorDescriptor::new(
                "serving_default_input:0",
                0,
                crate::DType::I8,
                &[1, 28, 28, 1],
            )],
            outputs: vec![TensorDescriptor::new(
                "StatefulPartitionedCall:0",
                0,
                crate::DType::I8,
                &[1, 10],
            )],
            latency: Duration::from_micros(500),
            fail_on_execute: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn failing_on(mut self, call: u64) -> Self {
        self.fail_on_execute = Some(call);
        self
    }
}

impl Default for SimProfile {
    fn default() -> Self {
        Self::mnist_int8()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ir_weights_follow_descriptor() {
        let ModelArtifact::OpenVinoIr {
            descriptor,
            weights,
        } = ModelArtifact::openvino_ir("models/mnist.xml")
        else {
            panic!("expected IR artifact");
        };
        assert_eq!(descriptor, PathBuf::from("models/mnist.xml"));
        assert_eq!(weights, PathBuf::from("models/mnist.bin"));
    }
}
