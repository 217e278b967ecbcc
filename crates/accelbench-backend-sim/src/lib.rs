//! In-process accelerator stand-in.
//!
//! Serves a fixed tensor contract from a [`SimProfile`], blocks for the profile's latency
//! on every execute and can inject a device fault on a chosen call. Used for dry runs of
//! the harness and throughout its tests.

use std::thread;

use accelbench_core::{
    Backend, BenchError, BindingTable, DType, Device, ModelArtifact, ModelHandle, ModelSpec,
    Result, SimProfile, Tensor, TensorDescriptor,
};
use bytes::Bytes;
use tracing::debug;

pub struct SimBackend;

impl SimBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimModel {
    spec: ModelSpec,
    profile: SimProfile,
    bindings: BindingTable,
}

impl Backend for SimBackend {
    type Model = SimModel;

    fn name(&self) -> &'static str {
        "sim"
    }

    fn load(&self, artifact: &ModelArtifact, device: &Device) -> Result<Self::Model> {
        let ModelArtifact::Simulated(profile) = artifact else {
            return Err(BenchError::model_load(
                artifact,
                "sim backend expects a simulated artifact",
            ));
        };

        if profile.inputs.is_empty() {
            return Err(BenchError::model_load(artifact, "profile declares no inputs"));
        }

        let spec = ModelSpec {
            inputs: profile.inputs.clone(),
            outputs: profile.outputs.clone(),
        };
        spec.ensure_non_empty()
            .map_err(|reason| BenchError::model_load(artifact, reason))?;
        debug!(profile = %profile.name, %device, "simulated model loaded");

        Ok(SimModel {
            bindings: BindingTable::new(&spec),
            spec,
            profile: profile.clone(),
        })
    }
}

impl SimModel {
    /// Number of execute calls accepted so far, failed ones included.
    pub fn executions(&self) -> u64 {
        self.bindings.executions()
    }
}

impl ModelHandle for SimModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn bind(&mut self, index: usize, input: Tensor) -> Result<()> {
        self.bindings.bind(&self.spec, index, input)
    }

    fn execute(&mut self) -> Result<()> {
        let call = self.bindings.begin_execute()?;
        thread::sleep(self.profile.latency);

        if self.profile.fail_on_execute == Some(call) {
            return Err(BenchError::execution(call, "simulated device fault"));
        }

        let checksum = self
            .bindings
            .bound_inputs()
            .flat_map(|t| t.bytes.iter())
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        let outputs = self
            .spec
            .outputs
            .iter()
            .map(|desc| synth_output(desc, checksum))
            .collect();
        self.bindings.finish_execute(outputs);
        Ok(())
    }

    fn read_output(&self, index: usize) -> Result<Tensor> {
        self.bindings.output(&self.spec, index)
    }
}

/// Output whose element `i` is `(checksum + i) % 128`, encoded in the slot's dtype.
fn synth_output(desc: &TensorDescriptor, checksum: u8) -> Tensor {
    let mut bytes = Vec::with_capacity(desc.byte_size());
    for i in 0..desc.numel() {
        let v = ((checksum as usize + i) % 128) as i64;
        match desc.dtype {
            DType::F32 => bytes.extend_from_slice(&(v as f32).to_le_bytes()),
            DType::I64 => bytes.extend_from_slice(&v.to_le_bytes()),
            DType::I32 => bytes.extend_from_slice(&(v as i32).to_le_bytes()),
            DType::U8 => bytes.push(v as u8),
            DType::I8 => bytes.push(v as i8 as u8),
        }
    }
    Tensor::from_bytes(desc.dtype, desc.shape.clone(), Bytes::from(bytes))
}
