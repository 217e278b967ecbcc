//! Where the driver gets its per-iteration input samples from.

use std::fs;
use std::path::Path;

use accelbench_core::{BenchError, DType, Result, Shape, Stage, Tensor, TensorDescriptor};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

pub enum InputSource {
    /// Fresh uniformly distributed values every iteration.
    Synthetic(SyntheticInput),
    /// One sample decoded from disk, reused for every iteration.
    File(FileInput),
}

impl InputSource {
    pub fn synthetic(seed: Option<u64>) -> Self {
        InputSource::Synthetic(SyntheticInput::new(seed))
    }

    pub fn from_file(path: impl AsRef<Path>, desc: &TensorDescriptor) -> Result<Self> {
        Ok(InputSource::File(FileInput::open(path, desc)?))
    }

    pub fn next_sample(&mut self, desc: &TensorDescriptor) -> Result<Tensor> {
        match self {
            InputSource::Synthetic(synthetic) => Ok(synthetic.sample(desc)),
            InputSource::File(file) => Ok(file.sample()),
        }
    }
}

pub struct SyntheticInput {
    rng: StdRng,
}

impl SyntheticInput {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Integers cover their type's full range; floats are drawn from `[0, 1)`.
    pub fn sample(&mut self, desc: &TensorDescriptor) -> Tensor {
        let n = desc.numel();
        let mut bytes = Vec::with_capacity(desc.byte_size());
        match desc.dtype {
            DType::F32 => {
                for _ in 0..n {
                    bytes.extend_from_slice(&self.rng.gen::<f32>().to_le_bytes());
                }
            }
            DType::I64 => {
                for _ in 0..n {
                    bytes.extend_from_slice(&self.rng.gen::<i64>().to_le_bytes());
                }
            }
            DType::I32 => {
                for _ in 0..n {
                    bytes.extend_from_slice(&self.rng.gen::<i32>().to_le_bytes());
                }
            }
            DType::U8 | DType::I8 => {
                bytes.resize(n, 0);
                self.rng.fill(bytes.as_mut_slice());
            }
        }
        Tensor::from_bytes(desc.dtype, desc.shape.clone(), Bytes::from(bytes))
    }
}

/// A sample file: raw little-endian tensor bytes, or a text list of numbers.
///
/// `.bin`/`.raw` files are taken as raw bytes, as is anything that is not UTF-8.
/// Text files hold values separated by commas and/or whitespace, optionally wrapped in
/// `[` `]`. Files whose element count differs from the slot are still loaded; the mismatch
/// surfaces when the sample is bound.
pub struct FileInput {
    tensor: Tensor,
}

impl FileInput {
    pub fn open(path: impl AsRef<Path>, desc: &TensorDescriptor) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read(path).map_err(|e| BenchError::io(Stage::Input, path, e))?;

        let is_raw = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("bin" | "raw")
        );
        let tensor = if is_raw {
            from_raw(raw, desc)?
        } else {
            match String::from_utf8(raw) {
                Ok(text) => parse_text(&text, desc)?,
                Err(e) => from_raw(e.into_bytes(), desc)?,
            }
        };

        info!(
            path = %path.display(),
            dtype = %tensor.dtype,
            shape = %tensor.shape,
            "loaded input sample"
        );
        Ok(Self { tensor })
    }

    pub fn sample(&self) -> Tensor {
        self.tensor.clone()
    }
}

fn shape_for(desc: &TensorDescriptor, elements: usize) -> Shape {
    if elements == desc.numel() {
        desc.shape.clone()
    } else {
        Shape::from_slice(&[elements])
    }
}

fn from_raw(raw: Vec<u8>, desc: &TensorDescriptor) -> Result<Tensor> {
    let width = desc.dtype.byte_size();
    if raw.len() % width != 0 {
        return Err(BenchError::InvalidInput {
            reason: format!(
                "{} bytes is not a whole number of {} elements",
                raw.len(),
                desc.dtype
            ),
        });
    }
    let shape = shape_for(desc, raw.len() / width);
    Ok(Tensor::from_bytes(desc.dtype, shape, Bytes::from(raw)))
}

fn parse_text(text: &str, desc: &TensorDescriptor) -> Result<Tensor> {
    let body = text.trim();
    let body = body
        .strip_prefix('[')
        .and_then(|b| b.strip_suffix(']'))
        .unwrap_or(body);

    let mut bytes = Vec::with_capacity(desc.byte_size());
    let mut count = 0usize;
    for token in body
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
    {
        encode_value(token, desc.dtype, &mut bytes)?;
        count += 1;
    }
    debug!(values = count, "parsed text sample");

    Ok(Tensor::from_bytes(
        desc.dtype,
        shape_for(desc, count),
        Bytes::from(bytes),
    ))
}

fn encode_value(token: &str, dtype: DType, out: &mut Vec<u8>) -> Result<()> {
    let invalid = || BenchError::InvalidInput {
        reason: format!("'{token}' is not a valid {dtype} value"),
    };

    match dtype {
        DType::F32 => {
            let v: f32 = token.parse().map_err(|_| invalid())?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        DType::I64 => {
            let v: i64 = token.parse().map_err(|_| invalid())?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        DType::I32 => {
            let v: i32 = token.parse().map_err(|_| invalid())?;
            out.extend_from_slice(&v.to_le_bytes());
        }
        DType::U8 => {
            let v: u8 = token.parse().map_err(|_| invalid())?;
            out.push(v);
        }
        DType::I8 => {
            let v: i8 = token.parse().map_err(|_| invalid())?;
            out.push(v as u8);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn mnist() -> TensorDescriptor {
        TensorDescriptor::new("input", 0, DType::I8, &[1, 28, 28, 1])
    }

    #[test]
    fn synthetic_matches_descriptor() {
        let desc = TensorDescriptor::new("x", 0, DType::F32, &[1, 3, 4]);
        let mut input = SyntheticInput::new(Some(7));
        let t = input.sample(&desc);
        assert!(desc.check(&t).is_ok());
        assert!(t.to_f64_vec().iter().all(|v| (0.0..1.0).contains(v)));
    }

    #[test]
    fn seeded_synthetic_is_reproducible() {
        let desc = mnist();
        let a = SyntheticInput::new(Some(42)).sample(&desc);
        let b = SyntheticInput::new(Some(42)).sample(&desc);
        assert_eq!(a, b);
        assert_eq!(a.byte_len(), 784);
    }

    #[test]
    fn text_sample_json_style() -> anyhow::Result<()> {
        let desc = TensorDescriptor::new("x", 0, DType::I8, &[1, 4]);
        let mut file = tempfile::Builder::new().suffix(".json").tempfile()?;
        write!(file, "[1, -2,\n 3 , 127]")?;

        let input = FileInput::open(file.path(), &desc)?;
        let t = input.sample();
        assert_eq!(t.shape, desc.shape);
        assert_eq!(t.to_f64_vec(), vec![1.0, -2.0, 3.0, 127.0]);
        Ok(())
    }

    #[test]
    fn text_sample_one_slot_long_is_still_text() -> anyhow::Result<()> {
        let desc = TensorDescriptor::new("x", 0, DType::F32, &[1, 2]);
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
        write!(file, "1.0 2.0\n")?;
        assert_eq!(file.as_file().metadata()?.len() as usize, desc.byte_size());

        let t = FileInput::open(file.path(), &desc)?.sample();
        assert_eq!(t.to_f64_vec(), vec![1.0, 2.0]);
        Ok(())
    }

    #[test]
    fn non_utf8_without_extension_is_raw() -> anyhow::Result<()> {
        let desc = TensorDescriptor::new("x", 0, DType::U8, &[4]);
        let mut file = tempfile::Builder::new().suffix(".dat").tempfile()?;
        file.write_all(&[0xff, 0xfe, 0x00, 0x80])?;

        let t = FileInput::open(file.path(), &desc)?.sample();
        assert_eq!(t.to_f64_vec(), vec![255.0, 254.0, 0.0, 128.0]);
        Ok(())
    }

    #[test]
    fn text_sample_out_of_range() -> anyhow::Result<()> {
        let desc = TensorDescriptor::new("x", 0, DType::I8, &[2]);
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile()?;
        write!(file, "12 300")?;

        assert!(matches!(
            FileInput::open(file.path(), &desc),
            Err(BenchError::InvalidInput { .. })
        ));
        Ok(())
    }

    #[test]
    fn raw_sample_keeps_wrong_size_for_bind_to_reject() -> anyhow::Result<()> {
        let desc = mnist();
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile()?;
        file.write_all(&vec![0u8; 28 * 28 * 3])?;

        let t = FileInput::open(file.path(), &desc)?.sample();
        assert_eq!(t.shape.dims(), &[28 * 28 * 3]);
        assert!(matches!(
            desc.check(&t),
            Err(BenchError::ShapeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn missing_file_is_input_io_error() {
        let err = FileInput::open("/nonexistent/sample.bin", &mnist())
            .err()
            .expect("missing file");
        assert_eq!(err.stage(), Stage::Input);
    }
}
