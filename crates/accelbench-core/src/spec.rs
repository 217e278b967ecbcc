use crate::{BenchError, DType, Result, Shape, Stage, Tensor};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IOName(pub String);

/// Shape/type contract of one input or output slot of a loaded model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TensorDescriptor {
    pub name: IOName,
    /// Binding index of the slot on the backend.
    pub index: usize,
    pub dtype: DType,
    pub shape: Shape,
}

impl TensorDescriptor {
    pub fn new(name: impl Into<String>, index: usize, dtype: DType, dims: &[usize]) -> Self {
        Self {
            name: IOName(name.into()),
            index,
            dtype,
            shape: Shape::from_slice(dims),
        }
    }

    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    pub fn byte_size(&self) -> usize {
        self.numel() * self.dtype.byte_size()
    }

    /// Rejects a buffer that does not carry exactly this slot's element type and count.
    ///
    /// Shapes with the same element count (e.g. `[1, 784]` against `[1, 28, 28, 1]`) are
    /// accepted: accelerators consume the flat buffer.
    pub fn check(&self, tensor: &Tensor) -> Result<()> {
        if tensor.dtype != self.dtype
            || tensor.shape.numel() != self.numel()
            || tensor.byte_len() != self.byte_size()
        {
            return Err(BenchError::ShapeMismatch {
                slot: self.index,
                expected_dtype: self.dtype,
                expected_shape: self.shape.clone(),
                expected_bytes: self.byte_size(),
                actual_dtype: tensor.dtype,
                actual_shape: tensor.shape.clone(),
                actual_bytes: tensor.byte_len(),
            });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelSpec {
    pub inputs: Vec<TensorDescriptor>,
    pub outputs: Vec<TensorDescriptor>,
}

impl ModelSpec {
    pub fn input(&self, index: usize) -> Result<&TensorDescriptor> {
        self.inputs.get(index).ok_or_else(|| {
            BenchError::state(
                Stage::Bind,
                format!(
                    "input slot {index} does not exist (model has {} inputs)",
                    self.inputs.len()
                ),
            )
        })
    }

    pub fn output(&self, index: usize) -> Result<&TensorDescriptor> {
        self.outputs.get(index).ok_or_else(|| {
            BenchError::state(
                Stage::ReadOutput,
                format!(
                    "output slot {index} does not exist (model has {} outputs)",
                    self.outputs.len()
                ),
            )
        })
    }

    /// Backends call this at load: a slot with a zero dimension cannot carry a sample.
    pub fn ensure_non_empty(&self) -> std::result::Result<(), String> {
        let empty = self
            .inputs
            .iter()
            .map(|d| ("input", d))
            .chain(self.outputs.iter().map(|d| ("output", d)))
            .find(|(_, d)| d.numel() == 0);
        match empty {
            Some((kind, d)) => Err(format!(
                "{kind} slot {} ({}) has zero-sized shape {}",
                d.index, d.name.0, d.shape
            )),
            None => Ok(()),
        }
    }
}
