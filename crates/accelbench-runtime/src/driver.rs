use std::time::Instant;

use accelbench_core::{BenchError, ModelHandle, Result};
use tracing::{debug, error, info, warn};

use crate::{CancelToken, InputSource, ResultSink};

/// What a cancelled run hands back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CancelPolicy {
    /// Fail with [`BenchError::Cancelled`]; completed samples are dropped.
    #[default]
    Discard,
    /// Return the samples completed before cancellation.
    KeepPartial,
}

#[derive(Clone, Debug, Default)]
pub struct DriverOptions {
    /// Input slot the samples are bound to.
    pub input_slot: usize,
    /// Log progress every N iterations; 0 disables.
    pub progress_every: u64,
    pub cancel_policy: CancelPolicy,
}

/// Single-use timing loop over one loaded model.
///
/// The driver holds the handle's only mutable borrow for its whole lifetime, so no other
/// caller can touch the accelerator session while a run is in flight.
pub struct BenchmarkDriver<'h, M: ModelHandle + ?Sized> {
    model: &'h mut M,
    options: DriverOptions,
    cancel: CancelToken,
}

impl<'h, M: ModelHandle + ?Sized> BenchmarkDriver<'h, M> {
    pub fn new(model: &'h mut M, options: DriverOptions) -> Self {
        Self {
            model,
            options,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Runs `iterations` bind+execute rounds and returns their latencies in order.
    ///
    /// Sample generation is outside the timed window. Any bind or execute failure aborts
    /// the run and the partial samples are discarded.
    pub fn run(self, iterations: u64, source: &mut InputSource) -> Result<ResultSink> {
        let slot = self.options.input_slot;
        let desc = self.model.spec().input(slot)?.clone();

        info!(
            iterations,
            input = %desc.name.0,
            dtype = %desc.dtype,
            shape = %desc.shape,
            "starting benchmark"
        );

        let mut sink = ResultSink::with_capacity(iterations.min(1 << 20) as usize);
        for iteration in 1..=iterations {
            if self.cancel.is_cancelled() {
                let completed = iteration - 1;
                return match self.options.cancel_policy {
                    CancelPolicy::Discard => {
                        warn!(completed, "benchmark cancelled, discarding samples");
                        Err(BenchError::Cancelled { completed })
                    }
                    CancelPolicy::KeepPartial => {
                        warn!(completed, "benchmark cancelled, keeping partial samples");
                        Ok(sink)
                    }
                };
            }

            let sample = source.next_sample(&desc)?;

            let t0 = Instant::now();
            let outcome = self
                .model
                .bind(slot, sample)
                .and_then(|()| self.model.execute());
            let elapsed = t0.elapsed();

            if let Err(err) = outcome {
                error!(
                    iteration,
                    stage = %err.stage(),
                    error = %err,
                    "benchmark aborted, partial result discarded"
                );
                return Err(err);
            }

            sink.append_duration(elapsed);
            debug!(iteration, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "iteration done");

            if self.options.progress_every > 0 && iteration % self.options.progress_every == 0 {
                info!(iteration, iterations, "progress");
            }
        }

        info!(samples = sink.len(), "benchmark complete");
        Ok(sink)
    }
}
