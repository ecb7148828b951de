//! Run accounting
//!
//! Lock-free counters for outcomes plus a latency list for percentiles.

use super::config::Thresholds;
use super::iteration::IterationOutcome;
use crate::error::ErrorKind;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Shared recorder for one scenario run.
#[derive(Debug, Default)]
pub struct Recorder {
    scheduled: AtomicU64,
    started: AtomicU64,
    passed: AtomicU64,
    failed: AtomicU64,
    errored: AtomicU64,
    latencies: Mutex<Vec<Duration>>,
    errors: Mutex<BTreeMap<String, u64>>,
}

impl Recorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An iteration got an executor and started.
    pub fn started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    /// Dispatch stopped with `due` iterations scheduled so far.
    ///
    /// Due iterations that never started are counted as skipped.
    pub fn close_dispatch(&self, due: u64) {
        self.scheduled.store(due, Ordering::Relaxed);
    }

    /// Record a finished iteration.
    pub fn record(&self, outcome: &IterationOutcome) {
        self.latencies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(outcome.latency);

        match &outcome.failure {
            None => {
                self.passed.fetch_add(1, Ordering::Relaxed);
            }
            Some(failure) => {
                let kind = failure.error.kind();
                if kind == ErrorKind::Assertion {
                    self.failed.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.errored.fetch_add(1, Ordering::Relaxed);
                }
                *self
                    .errors
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .entry(format!("{}@{}", kind, failure.at))
                    .or_default() += 1;
            }
        }
    }

    /// Record an iteration whose task died without an outcome.
    pub fn record_lost(&self) {
        self.errored.fetch_add(1, Ordering::Relaxed);
        *self
            .errors
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry("panic".to_string())
            .or_default() += 1;
    }

    /// Build the report against the run's `target` iteration count.
    pub fn report(&self, name: &str, target: u64, elapsed: Duration) -> ScenarioReport {
        let mut latencies = self
            .latencies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        latencies.sort_unstable();

        let started = self.started.load(Ordering::Relaxed);
        let scheduled = self.scheduled.load(Ordering::Relaxed).max(started);

        ScenarioReport {
            name: name.to_string(),
            target,
            scheduled,
            started,
            skipped: scheduled - started,
            passed: self.passed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            errored: self.errored.load(Ordering::Relaxed),
            latency: LatencySummary::from_sorted(&latencies),
            elapsed_ms: elapsed.as_millis() as u64,
            errors: self
                .errors
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .clone(),
        }
    }
}

/// Latency distribution in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    /// Fastest iteration
    pub min_ms: f64,
    /// Mean
    pub avg_ms: f64,
    /// Median
    pub p50_ms: f64,
    /// 90th percentile
    pub p90_ms: f64,
    /// 95th percentile
    pub p95_ms: f64,
    /// 99th percentile
    pub p99_ms: f64,
    /// Slowest iteration
    pub max_ms: f64,
}

impl LatencySummary {
    /// Summarize an ascending list of durations.
    pub fn from_sorted(sorted: &[Duration]) -> Self {
        if sorted.is_empty() {
            return Self::default();
        }
        let ms = |d: Duration| d.as_secs_f64() * 1000.0;
        let total: Duration = sorted.iter().sum();

        Self {
            min_ms: ms(sorted[0]),
            avg_ms: ms(total) / sorted.len() as f64,
            p50_ms: ms(percentile(sorted, 0.50)),
            p90_ms: ms(percentile(sorted, 0.90)),
            p95_ms: ms(percentile(sorted, 0.95)),
            p99_ms: ms(percentile(sorted, 0.99)),
            max_ms: ms(sorted[sorted.len() - 1]),
        }
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice.
pub fn percentile(sorted: &[Duration], p: f64) -> Duration {
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

/// Outcome of one threshold check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdResult {
    /// Human readable criterion, e.g. `p(95)<500ms`
    pub criterion: String,
    /// Observed value
    pub observed: f64,
    /// Whether it held
    pub passed: bool,
}

/// Aggregated result of one scenario run.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    /// Scenario name
    pub name: String,
    /// Iterations the full schedule aims for
    pub target: u64,
    /// Iterations that became due
    pub scheduled: u64,
    /// Iterations that started
    pub started: u64,
    /// Due iterations that never started
    pub skipped: u64,
    /// Iterations whose check passed
    pub passed: u64,
    /// Iterations whose check failed
    pub failed: u64,
    /// Iterations that failed before the check
    pub errored: u64,
    /// Iteration duration distribution
    pub latency: LatencySummary,
    /// Wall time of the run
    pub elapsed_ms: u64,
    /// Failures by `kind@state`
    pub errors: BTreeMap<String, u64>,
}

impl ScenarioReport {
    /// Iterations that finished, whatever the outcome.
    pub fn completed(&self) -> u64 {
        self.passed + self.failed + self.errored
    }

    /// Passed share of completed iterations.
    pub fn pass_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.0,
            n => self.passed as f64 / n as f64,
        }
    }

    /// Completed share of the target.
    pub fn iteration_ratio(&self) -> f64 {
        match self.target {
            0 => 1.0,
            n => self.completed() as f64 / n as f64,
        }
    }

    /// Evaluate the thresholds.
    pub fn evaluate(&self, thresholds: &Thresholds) -> Vec<ThresholdResult> {
        vec![
            ThresholdResult {
                criterion: format!("p(95)<{}ms", thresholds.p95_ms),
                observed: self.latency.p95_ms,
                passed: self.latency.p95_ms < thresholds.p95_ms as f64,
            },
            ThresholdResult {
                criterion: format!("checks>={:.2}", thresholds.min_pass_rate),
                observed: self.pass_rate(),
                passed: self.completed() > 0 && self.pass_rate() >= thresholds.min_pass_rate,
            },
            ThresholdResult {
                criterion: format!("iterations>={:.2}", thresholds.min_iteration_ratio),
                observed: self.iteration_ratio(),
                passed: self.iteration_ratio() >= thresholds.min_iteration_ratio,
            },
        ]
    }

    /// Whether every threshold held.
    pub fn meets(&self, thresholds: &Thresholds) -> bool {
        self.evaluate(thresholds).iter().all(|t| t.passed)
    }
}
