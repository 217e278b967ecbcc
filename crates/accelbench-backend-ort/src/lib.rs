use accelbench_core::{
    Backend, BenchError, BindingTable, DType, Device, ModelArtifact, ModelHandle, ModelSpec,
    Result, Shape, Tensor, TensorDescriptor,
};
use bytes::Bytes;
use ort::{
    session::{builder::SessionBuilder, Session, SessionInputValue},
    tensor::TensorElementType,
    value::{DynValue, ValueType},
};
use tracing::debug;

/// ONNX Runtime backend; the accelerator is picked through an execution provider.
pub struct OrtBackend;

impl OrtBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrtBackend {
    fn default() -> Self {
        Self::new()
    }
}

pub struct OrtModel {
    spec: ModelSpec,
    session: Session,
    input_names: Vec<String>,
    bindings: BindingTable,
}

impl Backend for OrtBackend {
    type Model = OrtModel;

    fn name(&self) -> &'static str {
        "onnxruntime"
    }

    fn load(&self, artifact: &ModelArtifact, device: &Device) -> Result<Self::Model> {
        let ModelArtifact::OnnxPath(path) = artifact else {
            return Err(BenchError::model_load(
                artifact,
                "onnxruntime backend expects an ONNX file path",
            ));
        };
        if !path.is_file() {
            return Err(BenchError::model_load(artifact, "model file not found"));
        }

        let load_err = |e: ort::Error| BenchError::model_load(artifact, e);

        let builder = Session::builder()
            .map_err(load_err)?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(load_err)?;

        let builder = configure_session_builder(builder, device)
            .map_err(|reason| BenchError::model_load(artifact, reason))?;

        let session = builder.commit_from_file(path).map_err(load_err)?;

        let input_names = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();

        let spec =
            build_model_spec(&session).map_err(|reason| BenchError::model_load(artifact, reason))?;
        spec.ensure_non_empty()
            .map_err(|reason| BenchError::model_load(artifact, reason))?;
        debug!(
            inputs = spec.inputs.len(),
            outputs = spec.outputs.len(),
            %device,
            "onnx session ready"
        );

        Ok(OrtModel {
            bindings: BindingTable::new(&spec),
            spec,
            session,
            input_names,
        })
    }
}

impl ModelHandle for OrtModel {
    fn spec(&self) -> &ModelSpec {
        &self.spec
    }

    fn bind(&mut self, index: usize, input: Tensor) -> Result<()> {
        self.bindings.bind(&self.spec, index, input)
    }

    fn execute(&mut self) -> Result<()> {
        let call = self.bindings.begin_execute()?;

        let mut ort_inputs = Vec::with_capacity(self.input_names.len());
        for ((name, input), desc) in self
            .input_names
            .iter()
            .zip(self.bindings.bound_inputs())
            .zip(&self.spec.inputs)
        {
            let value =
                tensor_to_ort_value(input, desc).map_err(|e| BenchError::execution(call, e))?;
            ort_inputs.push((name.clone(), SessionInputValue::from(value)));
        }

        let out_tensors = {
            let outputs = self
                .session
                .run(ort_inputs)
                .map_err(|e| BenchError::execution(call, e))?;
            let mut out_tensors = Vec::with_capacity(outputs.len());
            for (_, value) in outputs.iter() {
                out_tensors
                    .push(ort_value_to_tensor(&value).map_err(|e| BenchError::execution(call, e))?);
            }
            out_tensors
        };

        self.bindings.finish_execute(out_tensors);
        Ok(())
    }

    fn read_output(&self, index: usize) -> Result<Tensor> {
        self.bindings.output(&self.spec, index)
    }
}

fn build_model_spec(session: &Session) -> std::result::Result<ModelSpec, String> {
    let inputs = session
        .inputs
        .iter()
        .enumerate()
        .map(|(i, input)| descriptor_from_value_type(&input.name, i, &input.input_type))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let outputs = session
        .outputs
        .iter()
        .enumerate()
        .map(|(i, output)| descriptor_from_value_type(&output.name, i, &output.output_type))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ModelSpec { inputs, outputs })
}

fn configure_session_builder(
    builder: SessionBuilder,
    device: &Device,
) -> std::result::Result<SessionBuilder, String> {
    match device {
        Device::Cpu => Ok(builder),
        Device::Cuda { device_id } => configure_cuda(builder, *device_id),
        Device::Named(name) => Err(format!(
            "unsupported device for onnxruntime: {name} (expected cpu or cuda:N)"
        )),
    }
}

fn configure_cuda(
    builder: SessionBuilder,
    device_id: u32,
) -> std::result::Result<SessionBuilder, String> {
    #[cfg(feature = "cuda")]
    {
        use ort::execution_providers::cuda::CUDAExecutionProvider;
        let ep = CUDAExecutionProvider::default()
            .with_device_id(device_id as i32)
            .build();
        builder
            .with_execution_providers([ep])
            .map_err(|e| format!("failed to enable ORT CUDA execution provider: {e}"))
    }
    #[cfg(not(feature = "cuda"))]
    {
        let _ = (builder, device_id);
        Err("CUDA requested but accelbench-backend-ort was built without the `cuda` feature".into())
    }
}

/// Dynamic dimensions are pinned to 1: the harness always runs batch-1 inference.
fn descriptor_from_value_type(
    name: &str,
    index: usize,
    value_type: &ValueType,
) -> std::result::Result<TensorDescriptor, String> {
    let ValueType::Tensor { ty, shape, .. } = value_type else {
        return Err(format!("{name}: unsupported non-tensor IO value type"));
    };

    let dtype = ort_tensor_element_to_dtype(*ty)?;
    let dims = shape
        .iter()
        .map(|d| if *d < 0 { 1 } else { *d as usize })
        .collect::<Vec<_>>();

    Ok(TensorDescriptor::new(name, index, dtype, &dims))
}

fn ort_tensor_element_to_dtype(ty: TensorElementType) -> std::result::Result<DType, String> {
    match ty {
        TensorElementType::Float32 => Ok(DType::F32),
        TensorElementType::Int64 => Ok(DType::I64),
        TensorElementType::Int32 => Ok(DType::I32),
        TensorElementType::Uint8 => Ok(DType::U8),
        TensorElementType::Int8 => Ok(DType::I8),
        _ => Err(format!("unsupported tensor element type: {ty}")),
    }
}

/// The bound buffer has already been checked against `desc`, so it is fed with the
/// model's own shape.
fn tensor_to_ort_value(
    tensor: &Tensor,
    desc: &TensorDescriptor,
) -> std::result::Result<DynValue, ort::Error> {
    let shape: Vec<usize> = desc.shape.dims().to_vec();
    let bytes = &tensor.bytes;

    let value = match tensor.dtype {
        DType::F32 => ort::value::Tensor::from_array((shape, bytes_to_f32(bytes)))?.into_dyn(),
        DType::I64 => ort::value::Tensor::from_array((shape, bytes_to_i64(bytes)))?.into_dyn(),
        DType::I32 => ort::value::Tensor::from_array((shape, bytes_to_i32(bytes)))?.into_dyn(),
        DType::U8 => ort::value::Tensor::from_array((shape, bytes.to_vec()))?.into_dyn(),
        DType::I8 => {
            let data: Vec<i8> = bytes.iter().map(|b| *b as i8).collect();
            ort::value::Tensor::from_array((shape, data))?.into_dyn()
        }
    };

    Ok(value)
}

fn ort_value_to_tensor(value: &ort::value::ValueRef<'_>) -> std::result::Result<Tensor, String> {
    let ValueType::Tensor { ty, shape, .. } = value.dtype() else {
        return Err("non-tensor outputs are not supported".to_string());
    };

    let dims: Vec<usize> = shape.iter().map(|d| *d as usize).collect();
    let out_shape = Shape::from_slice(&dims);

    macro_rules! extract {
        ($t:ty, $dtype:expr) => {{
            let array = value
                .try_extract_array::<$t>()
                .map_err(|e| e.to_string())?;
            let slice = array
                .as_slice()
                .ok_or_else(|| "non-contiguous output tensor".to_string())?;
            Ok(Tensor::from_bytes(
                $dtype,
                out_shape,
                accelbench_core::bytes_from_slice(slice),
            ))
        }};
    }

    match *ty {
        TensorElementType::Float32 => extract!(f32, DType::F32),
        TensorElementType::Int64 => extract!(i64, DType::I64),
        TensorElementType::Int32 => extract!(i32, DType::I32),
        TensorElementType::Int8 => extract!(i8, DType::I8),
        TensorElementType::Uint8 => {
            let array = value.try_extract_array::<u8>().map_err(|e| e.to_string())?;
            let slice = array
                .as_slice()
                .ok_or_else(|| "non-contiguous output tensor".to_string())?;
            Ok(Tensor::from_bytes(
                DType::U8,
                out_shape,
                Bytes::copy_from_slice(slice),
            ))
        }
        _ => Err(format!("unsupported output tensor element type: {ty}")),
    }
}

fn bytes_to_f32(bytes: &Bytes) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn bytes_to_i64(bytes: &Bytes) -> Vec<i64> {
    bytes
        .chunks_exact(8)
        .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .collect()
}

fn bytes_to_i32(bytes: &Bytes) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
