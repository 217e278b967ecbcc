//! Run settings: TOML file defaults merged under command-line flags.

use std::path::{Path, PathBuf};

use accelbench_core::Device;
use accelbench_runtime::{CancelPolicy, DriverOptions};
use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::RunArgs;
use crate::registry::BackendKind;

/// Contents of a `--config` file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    pub backend: Option<BackendKind>,
    pub model: Option<PathBuf>,
    pub weights: Option<PathBuf>,
    pub device: Option<String>,
    pub iterations: Option<u64>,
    pub input: Option<String>,
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub input_slot: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub keep_partial: Option<bool>,
    pub progress_every: Option<u64>,
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: BenchConfig = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputChoice {
    Random,
    File(PathBuf),
}

/// Fully resolved settings for one benchmark run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub backend: BackendKind,
    pub model: Option<PathBuf>,
    pub weights: Option<PathBuf>,
    pub device: Device,
    pub iterations: u64,
    pub input: InputChoice,
    pub seed: Option<u64>,
    pub output: PathBuf,
    pub timeout_secs: Option<u64>,
    pub driver: DriverOptions,
}

impl RunSettings {
    pub const DEFAULT_ITERATIONS: u64 = 1000;
    pub const DEFAULT_OUTPUT: &'static str = "latency.csv";

    pub fn resolve(args: RunArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => BenchConfig::load(path)?,
            None => BenchConfig::default(),
        };
        Self::merge(args, file)
    }

    /// Flags win over file values, file values win over defaults.
    pub fn merge(args: RunArgs, file: BenchConfig) -> Result<Self> {
        let backend = args.backend.or(file.backend).unwrap_or(BackendKind::Sim);

        let device = args
            .device
            .or(file.device)
            .unwrap_or_else(|| "cpu".to_string());
        let device: Device = device.parse().context("invalid --device")?;

        let input = match args.input.or(file.input) {
            None => InputChoice::Random,
            Some(raw) if raw.eq_ignore_ascii_case("random") => InputChoice::Random,
            Some(path) => InputChoice::File(PathBuf::from(path)),
        };

        let keep_partial = args.keep_partial.or(file.keep_partial).unwrap_or(false);
        let driver = DriverOptions {
            input_slot: args.input_slot.or(file.input_slot).unwrap_or(0),
            progress_every: args
                .progress_every
                .or(file.progress_every)
                .unwrap_or(0),
            cancel_policy: if keep_partial {
                CancelPolicy::KeepPartial
            } else {
                CancelPolicy::Discard
            },
        };

        Ok(Self {
            backend,
            model: args.model.or(file.model),
            weights: args.weights.or(file.weights),
            device,
            iterations: args
                .iterations
                .or(file.iterations)
                .unwrap_or(Self::DEFAULT_ITERATIONS),
            input,
            seed: args.seed.or(file.seed),
            output: args
                .output
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_OUTPUT)),
            timeout_secs: args.timeout_secs.or(file.timeout_secs),
            driver,
        })
    }
}
