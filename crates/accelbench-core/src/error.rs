//! Error taxonomy shared by every backend and the benchmark driver.

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::{DType, Shape};

pub type Result<T> = std::result::Result<T, BenchError>;

/// Pipeline stage an error was raised in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Load,
    Bind,
    Execute,
    ReadOutput,
    Input,
    Serialize,
    Cancel,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Load => "load",
            Stage::Bind => "bind",
            Stage::Execute => "execute",
            Stage::ReadOutput => "read-output",
            Stage::Input => "input",
            Stage::Serialize => "serialize",
            Stage::Cancel => "cancel",
        })
    }
}

#[derive(Error, Debug)]
pub enum BenchError {
    /// Model file missing, corrupt, or the accelerator runtime is unavailable.
    #[error("failed to load model {artifact}: {reason}")]
    ModelLoad { artifact: String, reason: String },

    #[error(
        "input slot {slot} mismatch: expected {expected_dtype}{expected_shape} ({expected_bytes} bytes), \
         got {actual_dtype}{actual_shape} ({actual_bytes} bytes)"
    )]
    ShapeMismatch {
        slot: usize,
        expected_dtype: DType,
        expected_shape: Shape,
        expected_bytes: usize,
        actual_dtype: DType,
        actual_shape: Shape,
        actual_bytes: usize,
    },

    /// Accelerator fault during an inference pass.
    #[error("inference failed on iteration {iteration}: {reason}")]
    Execution { iteration: u64, reason: String },

    /// Contract violation, e.g. reading an output before a successful execute.
    #[error("invalid call sequence during {stage}: {reason}")]
    State { stage: Stage, reason: String },

    #[error("I/O error during {stage} on {}: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("benchmark cancelled after {completed} completed iterations")]
    Cancelled { completed: u64 },
}

impl BenchError {
    pub fn model_load(artifact: impl fmt::Display, reason: impl fmt::Display) -> Self {
        BenchError::ModelLoad {
            artifact: artifact.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn execution(iteration: u64, reason: impl fmt::Display) -> Self {
        BenchError::Execution {
            iteration,
            reason: reason.to_string(),
        }
    }

    pub fn state(stage: Stage, reason: impl Into<String>) -> Self {
        BenchError::State {
            stage,
            reason: reason.into(),
        }
    }

    pub fn io(stage: Stage, path: impl Into<PathBuf>, source: io::Error) -> Self {
        BenchError::Io {
            stage,
            path: path.into(),
            source,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            BenchError::ModelLoad { .. } => Stage::Load,
            BenchError::ShapeMismatch { .. } => Stage::Bind,
            BenchError::Execution { .. } => Stage::Execute,
            BenchError::State { stage, .. } | BenchError::Io { stage, .. } => *stage,
            BenchError::InvalidInput { .. } => Stage::Input,
            BenchError::Cancelled { .. } => Stage::Cancel,
        }
    }
}
