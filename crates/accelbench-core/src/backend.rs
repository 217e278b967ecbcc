use crate::{
    BenchError, Device, ModelArtifact, ModelSpec, Result, Stage, Tensor, TensorDescriptor,
};

/// Factory for model handles on one kind of inference engine.
pub trait Backend {
    type Model: ModelHandle;

    fn name(&self) -> &'static str;
    fn load(&self, artifact: &ModelArtifact, device: &Device) -> Result<Self::Model>;
}

/// A model loaded onto an accelerator.
///
/// Calls are synchronous: `execute` blocks the calling thread for the whole inference
/// pass. Handles are not required to be reentrant, hence `&mut self` everywhere state
/// changes.
pub trait ModelHandle {
    fn spec(&self) -> &ModelSpec;

    fn describe_inputs(&self) -> &[TensorDescriptor] {
        &self.spec().inputs
    }

    fn describe_outputs(&self) -> &[TensorDescriptor] {
        &self.spec().outputs
    }

    /// Fails with [`BenchError::ShapeMismatch`] unless `input` matches the slot exactly.
    fn bind(&mut self, index: usize, input: Tensor) -> Result<()>;

    fn execute(&mut self) -> Result<()>;

    /// Copy of an output slot from the last successful `execute`.
    fn read_output(&self, index: usize) -> Result<Tensor>;
}

impl<M: ModelHandle + ?Sized> ModelHandle for Box<M> {
    fn spec(&self) -> &ModelSpec {
        (**self).spec()
    }

    fn bind(&mut self, index: usize, input: Tensor) -> Result<()> {
        (**self).bind(index, input)
    }

    fn execute(&mut self) -> Result<()> {
        (**self).execute()
    }

    fn read_output(&self, index: usize) -> Result<Tensor> {
        (**self).read_output(index)
    }
}

/// Slot bookkeeping shared by the backends: what is bound, whether outputs are readable.
#[derive(Debug, Default)]
pub struct BindingTable {
    inputs: Vec<Option<Tensor>>,
    outputs: Option<Vec<Tensor>>,
    executions: u64,
}

impl BindingTable {
    pub fn new(spec: &ModelSpec) -> Self {
        Self {
            inputs: vec![None; spec.inputs.len()],
            outputs: None,
            executions: 0,
        }
    }

    pub fn bind(&mut self, spec: &ModelSpec, index: usize, input: Tensor) -> Result<()> {
        spec.input(index)?.check(&input)?;
        self.inputs[index] = Some(input);
        Ok(())
    }

    /// Marks the start of an execute call and returns its 1-based sequence number.
    ///
    /// Outputs of the previous call stop being readable from here on.
    pub fn begin_execute(&mut self) -> Result<u64> {
        self.outputs = None;
        if let Some(slot) = self.inputs.iter().position(Option::is_none) {
            return Err(BenchError::state(
                Stage::Execute,
                format!("input slot {slot} has no bound buffer"),
            ));
        }
        self.executions += 1;
        Ok(self.executions)
    }

    pub fn bound_inputs(&self) -> impl Iterator<Item = &Tensor> {
        self.inputs.iter().flatten()
    }

    pub fn finish_execute(&mut self, outputs: Vec<Tensor>) {
        self.outputs = Some(outputs);
    }

    pub fn executions(&self) -> u64 {
        self.executions
    }

    pub fn output(&self, spec: &ModelSpec, index: usize) -> Result<Tensor> {
        spec.output(index)?;
        let outputs = self.outputs.as_ref().ok_or_else(|| {
            BenchError::state(
                Stage::ReadOutput,
                "no successful execute to read outputs from",
            )
        })?;
        outputs.get(index).cloned().ok_or_else(|| {
            BenchError::state(
                Stage::ReadOutput,
                format!("backend produced no tensor for output slot {index}"),
            )
        })
    }
}
