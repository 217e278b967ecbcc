use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use smallvec::SmallVec;

use crate::BenchError;

/// Accelerator a model is compiled for.
///
/// `Named` is handed to the vendor runtime untouched (`MYRIAD`, `HETERO:MYRIAD,CPU`, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: u32 },
    Named(String),
}

impl FromStr for Device {
    type Err = BenchError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(BenchError::InvalidInput {
                reason: "device name is empty".to_string(),
            });
        }

        if raw.eq_ignore_ascii_case("cpu") {
            return Ok(Device::Cpu);
        }

        if let Some(rest) = raw.strip_prefix("cuda:") {
            let device_id = rest.parse().map_err(|_| BenchError::InvalidInput {
                reason: format!("invalid cuda device id: {rest}"),
            })?;
            return Ok(Device::Cuda { device_id });
        }

        Ok(Device::Named(raw.to_string()))
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda { device_id } => write!(f, "cuda:{device_id}"),
            Device::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    I64,
    I32,
    U8,
    I8,
}

impl DType {
    pub fn byte_size(self) -> usize {
        match self {
            DType::F32 => 4,
            DType::I64 => 8,
            DType::I32 => 4,
            DType::U8 | DType::I8 => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::I64 => "i64",
            DType::I32 => "i32",
            DType::U8 => "u8",
            DType::I8 => "i8",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape(pub SmallVec<[usize; 6]>);

impl Shape {
    pub fn from_slice(d: &[usize]) -> Self {
        Self(d.iter().copied().collect())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    /// Zero for any shape with a zero dimension; one for a scalar.
    pub fn numel(&self) -> usize {
        self.0.iter().product()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0.as_slice())
    }
}

/// Host-side tensor buffer. Elements are stored little-endian and densely packed.
#[derive(Clone, Debug, PartialEq)]
pub struct Tensor {
    pub dtype: DType,
    pub shape: Shape,
    pub bytes: Bytes,
}

impl Tensor {
    pub fn from_bytes(dtype: DType, shape: Shape, bytes: Bytes) -> Self {
        Self {
            dtype,
            shape,
            bytes,
        }
    }

    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        let byte_len = shape.numel() * dtype.byte_size();
        Self::from_bytes(dtype, shape, Bytes::from(vec![0u8; byte_len]))
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Number of whole elements actually held by the buffer.
    pub fn element_count(&self) -> usize {
        self.bytes.len() / self.dtype.byte_size()
    }

    /// Decodes every element to f64, for inspection of small outputs.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        let width = self.dtype.byte_size();
        self.bytes
            .chunks_exact(width)
            .map(|b| match self.dtype {
                DType::F32 => f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
                DType::I64 => {
                    i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f64
                }
                DType::I32 => i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64,
                DType::U8 => b[0] as f64,
                DType::I8 => b[0] as i8 as f64,
            })
            .collect()
    }

    /// Index of the largest element, or `None` for an empty buffer.
    pub fn argmax(&self) -> Option<usize> {
        self.to_f64_vec()
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
                Some((_, b)) if b >= v => best,
                _ => Some((i, v)),
            })
            .map(|(i, _)| i)
    }
}

pub fn bytes_from_slice<T: Copy>(slice: &[T]) -> Bytes {
    let byte_len = std::mem::size_of_val(slice);
    let ptr = slice.as_ptr().cast::<u8>();
    // SAFETY: `slice` is valid for `byte_len` bytes and every caller passes plain numeric types.
    let bytes = unsafe { std::slice::from_raw_parts(ptr, byte_len) };
    Bytes::copy_from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("CPU".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!(
            "cuda:1".parse::<Device>().unwrap(),
            Device::Cuda { device_id: 1 }
        );
        assert_eq!(
            "MYRIAD".parse::<Device>().unwrap(),
            Device::Named("MYRIAD".to_string())
        );
        assert!("cuda:x".parse::<Device>().is_err());
        assert!("".parse::<Device>().is_err());
    }

    #[test]
    fn numel_and_bytes() {
        let shape = Shape::from_slice(&[1, 28, 28, 1]);
        assert_eq!(shape.numel(), 784);
        assert_eq!(shape.rank(), 4);

        let t = Tensor::zeros(DType::F32, shape);
        assert_eq!(t.byte_len(), 784 * 4);
        assert_eq!(t.element_count(), 784);
    }

    #[test]
    fn zero_dimension_has_no_elements() {
        assert_eq!(Shape::from_slice(&[1, 0, 28]).numel(), 0);
        assert_eq!(Shape::from_slice(&[]).numel(), 1);
        assert_eq!(Tensor::zeros(DType::I8, Shape::from_slice(&[0, 10])).byte_len(), 0);
    }

    #[test]
    fn argmax_picks_first_maximum() {
        let data: Vec<i8> = vec![-3, 7, 2, 7];
        let t = Tensor::from_bytes(
            DType::I8,
            Shape::from_slice(&[1, 4]),
            bytes_from_slice(&data),
        );
        assert_eq!(t.argmax(), Some(1));
        assert_eq!(t.to_f64_vec(), vec![-3.0, 7.0, 2.0, 7.0]);
    }
}
