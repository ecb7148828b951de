//! Scenario driver
//!
//! Generates handshakes at a constant arrival rate over a bounded executor
//! pool and checks every response:
//! - config: load shape, entry point and thresholds
//! - iteration: one isolated `Init → … → Done | Failed` run
//! - driver: scheduling, backpressure and draining
//! - stats: outcome counters, latency percentiles and threshold checks

mod config;
mod driver;
mod iteration;
mod stats;

pub use config::{ScenarioConfig, ScenarioKind, Thresholds};
pub use driver::ScenarioDriver;
pub use iteration::{IterationContext, IterationOutcome};
pub use stats::{percentile, LatencySummary, Recorder, ScenarioReport, ThresholdResult};
