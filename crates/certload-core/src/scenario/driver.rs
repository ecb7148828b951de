//! Constant-arrival-rate driver
//!
//! A ticker makes one iteration due every `interval`. Each due iteration
//! takes a permit from a pool of `pre_allocated_vus` executors; when the pool
//! is exhausted the iteration waits for a permit instead of being dropped,
//! and the ticker delivers the missed ticks in a burst once a slot frees.
//! When the duration elapses (or the token is cancelled) dispatch stops and
//! in-flight iterations are drained. Ticks that were due by then but never
//! started are reported as skipped.

use super::config::ScenarioConfig;
use super::iteration::IterationContext;
use super::stats::{Recorder, ScenarioReport};
use crate::auth::Endpoints;
use crate::error::Result;
use crate::transport::Transport;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives one scenario.
pub struct ScenarioDriver {
    config: ScenarioConfig,
    context: Arc<IterationContext>,
    cancel: CancellationToken,
}

impl ScenarioDriver {
    /// Create a driver after validating the config.
    pub fn new(
        config: ScenarioConfig,
        transport: Arc<dyn Transport>,
        endpoints: &Endpoints,
    ) -> Result<Self> {
        config.validate()?;
        endpoints.validate()?;

        let context = IterationContext::new(
            config.exec,
            config.expected_status(),
            transport,
            endpoints,
        );
        Ok(Self {
            config,
            context: Arc::new(context),
            cancel: CancellationToken::new(),
        })
    }

    /// Stop dispatching when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The scenario configuration.
    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Run the scenario to completion.
    pub async fn run(&self) -> ScenarioReport {
        let recorder = Arc::new(Recorder::new());
        let pool = Arc::new(Semaphore::new(self.config.pre_allocated_vus));
        let start = Instant::now();
        let deadline = start + self.config.duration();
        let mut ticker = tokio::time::interval(self.config.interval());
        let mut tasks = JoinSet::new();
        let mut next_id: u64 = 0;

        info!(
            scenario = %self.config.name,
            exec = %self.config.exec,
            rate = self.config.rate,
            interval_us = self.config.interval().as_micros() as u64,
            duration_secs = self.config.duration_secs,
            vus = self.config.pre_allocated_vus,
            "Scenario started"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = sleep_until(deadline) => break,
                _ = ticker.tick() => {}
            }

            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                _ = sleep_until(deadline) => None,
                permit = pool.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                debug!(scenario = %self.config.name, "Run ended while waiting for an executor");
                break;
            };

            next_id += 1;
            let id = next_id;
            let context = self.context.clone();
            let rec = recorder.clone();
            recorder.started();
            tasks.spawn(async move {
                let outcome = context.run(id).await;
                rec.record(&outcome);
                drop(permit);
            });

            while let Some(joined) = tasks.try_join_next() {
                reap(joined, &recorder);
            }
        }

        // Every tick due before dispatch stopped counts, received or not.
        let window = Instant::now().min(deadline) - start;
        let due = self.config.due_iterations(window);
        recorder.close_dispatch(due);
        debug!(
            scenario = %self.config.name,
            due,
            in_flight = tasks.len(),
            "Dispatch stopped, draining"
        );
        while let Some(joined) = tasks.join_next().await {
            reap(joined, &recorder);
        }

        let report = recorder.report(
            &self.config.name,
            self.config.target_iterations(),
            start.elapsed(),
        );
        info!(
            scenario = %report.name,
            target = report.target,
            started = report.started,
            skipped = report.skipped,
            passed = report.passed,
            failed = report.failed,
            errored = report.errored,
            p95_ms = report.latency.p95_ms,
            "Scenario finished"
        );
        report
    }
}

fn reap(joined: std::result::Result<(), tokio::task::JoinError>, recorder: &Recorder) {
    if let Err(e) = joined {
        warn!(error = %e, "Iteration task died");
        recorder.record_lost();
    }
}
