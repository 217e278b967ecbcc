//! In-memory latency samples and their one-shot persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use accelbench_core::{BenchError, Result, Stage};

use crate::LatencySummary;

/// Ordered per-iteration latencies in milliseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSink {
    samples: Vec<f64>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, sample_ms: f64) {
        debug_assert!(sample_ms >= 0.0, "latency sample must not be negative");
        self.samples.push(sample_ms);
    }

    pub fn append_duration(&mut self, elapsed: Duration) {
        self.append(elapsed.as_secs_f64() * 1000.0);
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn summary(&self) -> Option<LatencySummary> {
        LatencySummary::from_samples(&self.samples)
    }

    /// Writes one millisecond value per line, no header, replacing any existing file.
    ///
    /// The samples stay in memory on failure so the caller can retry another path.
    pub fn serialize(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let io_err = |e| BenchError::io(Stage::Serialize, path, e);

        let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
        for sample in &self.samples {
            writeln!(out, "{sample}").map_err(io_err)?;
        }
        out.flush().map_err(io_err)?;
        Ok(())
    }

    /// Reads back a file written by [`ResultSink::serialize`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| BenchError::io(Stage::Input, path, e))?;

        let samples = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .enumerate()
            .map(|(i, line)| {
                line.parse::<f64>().map_err(|_| BenchError::InvalidInput {
                    reason: format!("{}:{}: '{line}' is not a latency value", path.display(), i + 1),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { samples })
    }
}

impl From<Vec<f64>> for ResultSink {
    fn from(samples: Vec<f64>) -> Self {
        Self { samples }
    }
}
