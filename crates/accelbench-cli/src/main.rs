mod cli;
mod config;
mod registry;

use std::path::Path;
use std::time::Duration;

use accelbench_runtime::{BenchmarkDriver, CancelToken, InputSource, ResultSink};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use config::{InputChoice, RunSettings};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log).context("invalid --log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Run(args) => {
            let settings = RunSettings::resolve(args)?;
            run(settings).await
        }
        Command::Report { path } => report(&path),
    }
}

async fn run(settings: RunSettings) -> Result<()> {
    let output = settings.output.clone();
    let timeout = settings.timeout_secs.map(Duration::from_secs);

    // The model is created, driven and dropped on one blocking thread.
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let mut bench = tokio::task::spawn_blocking(move || benchmark(settings, token));

    let sink = tokio::select! {
        joined = &mut bench => joined.context("benchmark thread failed")??,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupt received, stopping after the current iteration");
            cancel.cancel();
            bench.await.context("benchmark thread failed")??
        }
        _ = deadline(timeout) => {
            warn!(timeout_secs = timeout.map(|t| t.as_secs()), "timeout reached, stopping after the current iteration");
            cancel.cancel();
            bench.await.context("benchmark thread failed")??
        }
    };

    sink.serialize(&output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(path = %output.display(), samples = sink.len(), "latency file written");

    if let Some(summary) = sink.summary() {
        info!(%summary, "latency summary");
    }
    Ok(())
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(t) => tokio::time::sleep(t).await,
        None => std::future::pending().await,
    }
}

fn benchmark(settings: RunSettings, cancel: CancelToken) -> Result<ResultSink> {
    let mut model = registry::load(
        settings.backend,
        settings.model,
        settings.weights,
        &settings.device,
    )
    .context("loading model")?;
    info!(backend = ?settings.backend, device = %settings.device, "model loaded");

    for desc in model.describe_inputs() {
        info!(slot = desc.index, name = %desc.name.0, dtype = %desc.dtype, shape = %desc.shape, "input");
    }
    for desc in model.describe_outputs() {
        info!(slot = desc.index, name = %desc.name.0, dtype = %desc.dtype, shape = %desc.shape, "output");
    }

    let desc = model.spec().input(settings.driver.input_slot)?.clone();
    let mut source = match &settings.input {
        InputChoice::Random => InputSource::synthetic(settings.seed),
        InputChoice::File(path) => InputSource::from_file(path, &desc)
            .with_context(|| format!("loading input sample {}", path.display()))?,
    };

    let sink = BenchmarkDriver::new(&mut model, settings.driver)
        .with_cancel(cancel)
        .run(settings.iterations, &mut source)?;

    if !sink.is_empty() && !model.describe_outputs().is_empty() {
        match model.read_output(0) {
            Ok(out) => info!(
                dtype = %out.dtype,
                shape = %out.shape,
                argmax = ?out.argmax(),
                "last output"
            ),
            Err(err) => warn!(error = %err, "could not read output slot 0"),
        }
    }

    Ok(sink)
}

fn report(path: &Path) -> Result<()> {
    let sink = ResultSink::load(path).with_context(|| format!("reading {}", path.display()))?;
    match sink.summary() {
        Some(summary) => info!(path = %path.display(), %summary, "latency summary"),
        None => warn!(path = %path.display(), "latency file holds no samples"),
    }
    Ok(())
}
