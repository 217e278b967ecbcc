use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::registry::BackendKind;

#[derive(Parser, Debug)]
#[command(name = "accelbench", version, about = "Repeated-inference latency benchmark")]
pub struct Cli {
    /// Log level (RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a model and time repeated inferences on it
    Run(RunArgs),

    /// Summarize a latency file written by `run`
    Report {
        /// Latency file, one millisecond value per line
        path: PathBuf,
    },
}

/// Flags left unset fall back to the `--config` file, then to built-in defaults.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// TOML file with default run settings
    #[arg(long, env = "ACCELBENCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Inference backend
    #[arg(long, value_enum, env = "ACCELBENCH_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Model file (.onnx, or OpenVINO .xml)
    #[arg(long, env = "ACCELBENCH_MODEL")]
    pub model: Option<PathBuf>,

    /// OpenVINO weights file (defaults to the model path with a .bin extension)
    #[arg(long)]
    pub weights: Option<PathBuf>,

    /// Device for inference (cpu, cuda:N, or a plugin name such as MYRIAD)
    #[arg(long, env = "ACCELBENCH_DEVICE")]
    pub device: Option<String>,

    /// Number of timed inferences
    #[arg(long, short = 'n')]
    pub iterations: Option<u64>,

    /// Input sample file, or `random` for fresh synthetic data each iteration
    #[arg(long)]
    pub input: Option<String>,

    /// Seed for synthetic input
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write the latency file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Input slot that receives the samples
    #[arg(long)]
    pub input_slot: Option<usize>,

    /// Cancel the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write the samples completed before a cancellation instead of discarding them
    /// (`--keep-partial=false` overrides a config file that enables it)
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub keep_partial: Option<bool>,

    /// Log progress every N iterations (0 disables)
    #[arg(long)]
    pub progress_every: Option<u64>,
}
