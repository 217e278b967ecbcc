//! OpenVINO backend for vision processing units (MYRIAD) and the other OpenVINO devices.
//!
//! Models come as IR pairs: an `.xml` topology plus its `.bin` weights.

use std::fmt::Display;

use accelbench_core::{
    Backend, BenchError, BindingTable, DType, Device, ModelArtifact, ModelHandle, ModelSpec,
    Result, Shape, Tensor, TensorDescriptor,
};
use bytes::Bytes;
use openvino::{CompiledModel, Core, ElementType, InferRequest};
use tracing::{debug, info};

pub struct OpenVinoBackend;

impl OpenVinoBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OpenVinoBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OpenVinoModel {
    spec: ModelSpec,
    request: InferRequest,
    bindings: BindingTable,
    // The request borrows engine state owned by these two; keep them alive with it.
    _compiled: CompiledModel,
    _core: Core,
}

impl Backend for OpenVinoBackend {
    type Model = OpenVinoModel;

    fn name(&self) -> &'static str {
        "openvino"
    }

    fn load(&self, artifact: &ModelArtifact, device: &Device) -> Result<Self::Model> {
        let ModelArtifact::OpenVinoIr {
            descriptor,
            weights,
        } = artifact
        else {
            return Err(BenchError::model_load(
                artifact,
                "openvino backend expects an IR descriptor + weights pair",
            ));
        };
        for path in [descriptor, weights] {
            if !path.is_file() {
                return Err(BenchError::model_load(
                    artifact,
                    format!("{} not found", path.display()),
                ));
            }
        }

        let device_name = openvino_device_name(device)
            .ok_or_else(|| BenchError::model_load(artifact, format!("unsupported device: {device}")))?;
        let load_err = |e: &dyn Display| BenchError::model_load(artifact, e);

        let mut core = Core::new().map_err(|e| load_err(&e))?;
        info!(descriptor = %descriptor.display(), weights = %weights.display(), "reading network");
        let model = core
            .read_model_from_file(&descriptor.to_string_lossy(), &weights.to_string_lossy())
            .map_err(|e| load_err(&e))?;

        let mut compiled = core
            .compile_model(&model, device_name.as_str().into())
            .map_err(|e| load_err(&e))?;
        let request = compiled
            .create_infer_request()
            .map_err(|e| load_err(&e))?;

        let input_count = model.get_inputs_len().map_err(|e| load_err(&e))?;
        let output_count = model.get_outputs_len().map_err(|e| load_err(&e))?;

        let mut inputs = Vec::with_capacity(input_count);
        for i in 0..input_count {
            let name = model
                .get_input_by_index(i)
                .and_then(|node| node.get_name())
                .map_err(|e| load_err(&e))?;
            let tensor = request
                .get_tensor(&name)
                .map_err(|e| load_err(&e))?;
            inputs.push(describe(&name, i, &tensor).map_err(|e| load_err(&e))?);
        }

        let mut outputs = Vec::with_capacity(output_count);
        for i in 0..output_count {
            let name = model
                .get_output_by_index(i)
                .and_then(|node| node.get_name())
                .map_err(|e| load_err(&e))?;
            let tensor = request
                .get_output_tensor_by_index(i)
                .map_err(|e| load_err(&e))?;
            outputs.push(describe(&name, i, &tensor).map_err(|e| load_err(&e))?);
        }

        let spec = ModelSpec { inputs, outputs };
        spec.ensure_non_empty().map_err(|reason| load_err(&reason))?;
        debug!(device = %device_name, inputs = input_count, outputs = output_count, "network compiled");

        Ok(OpenVinoModel {
            bindings: BindingTable::new(&spec),
            spec,
            request,
            _compiled: compiled,
            _core: core,
        })
    }
}

impl ModelHandle for OpenVinoModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn bind(&mut self, index: usize, input: Tensor) -> Result<()> {
        self.bindings.bind(&self.spec, index, input)
    }

    fn execute(&mut self) -> Result<()> {
        let call = self.bindings.begin_execute()?;
        let exec_err = |e: &dyn Display| BenchError::execution(call, e);

        for (i, (input, desc)) in self
            .bindings
            .bound_inputs()
            .zip(&self.spec.inputs)
            .enumerate()
        {
            let dims: Vec<i64> = desc.shape.dims().iter().map(|d| *d as i64).collect();
            let shape = openvino::Shape::new(&dims).map_err(|e| exec_err(&e))?;
            let mut tensor = openvino::Tensor::new(to_element_type(desc.dtype), &shape)
                .map_err(|e| exec_err(&e))?;
            tensor
                .get_raw_data_mut()
                .map_err(|e| exec_err(&e))?
                .copy_from_slice(&input.bytes);
            self.request
                .set_input_tensor_by_index(i, &tensor)
                .map_err(|e| exec_err(&e))?;
        }

        self.request.infer().map_err(|e| exec_err(&e))?;

        let mut outputs = Vec::with_capacity(self.spec.outputs.len());
        for desc in &self.spec.outputs {
            let tensor = self
                .request
                .get_output_tensor_by_index(desc.index)
                .map_err(|e| exec_err(&e))?;
            let data = tensor.get_raw_data().map_err(|e| exec_err(&e))?;
            outputs.push(Tensor::from_bytes(
                desc.dtype,
                desc.shape.clone(),
                Bytes::copy_from_slice(data),
            ));
        }

        self.bindings.finish_execute(outputs);
        Ok(())
    }

    fn read_output(&self, index: usize) -> Result<Tensor> {
        self.bindings.output(&self.spec, index)
    }
}

fn openvino_device_name(device: &Device) -> Option<String> {
    match device {
        Device::Cpu => Some("CPU".to_string()),
        Device::Cuda { .. } => None,
        Device::Named(name) => Some(name.clone()),
    }
}

fn describe(
    name: &str,
    index: usize,
    tensor: &openvino::Tensor,
) -> std::result::Result<TensorDescriptor, String> {
    let shape = tensor.get_shape().map_err(|e| e.to_string())?;
    let dims = shape
        .get_dimensions()
        .iter()
        .map(|d| usize::try_from(*d).map_err(|_| format!("{name}: dynamic dimension {d}")))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let element_type = tensor.get_element_type().map_err(|e| e.to_string())?;
    let dtype = from_element_type(element_type)
        .ok_or_else(|| format!("{name}: unsupported element type {element_type:?}"))?;

    Ok(TensorDescriptor {
        name: accelbench_core::IOName(name.to_string()),
        index,
        dtype,
        shape: Shape::from_slice(&dims),
    })
}

fn from_element_type(ty: ElementType) -> Option<DType> {
    match ty {
        ElementType::F32 => Some(DType::F32),
        ElementType::I64 => Some(DType::I64),
        ElementType::I32 => Some(DType::I32),
        ElementType::U8 => Some(DType::U8),
        ElementType::I8 => Some(DType::I8),
        _ => None,
    }
}

fn to_element_type(dtype: DType) -> ElementType {
    match dtype {
        DType::F32 => ElementType::F32,
        DType::I64 => ElementType::I64,
        DType::I32 => ElementType::I32,
        DType::U8 => ElementType::U8,
        DType::I8 => ElementType::I8,
    }
}
