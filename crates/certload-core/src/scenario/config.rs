//! Scenario configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Entry point executed by every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Full certificate handshake, expects 200
    Login,
    /// Empty body to the login endpoint, expects 400
    LoginWithoutCert,
    /// Handshake followed by a topic creation in the session, expects 200
    CreateTopic,
}

impl Default for ScenarioKind {
    fn default() -> Self {
        Self::Login
    }
}

impl ScenarioKind {
    /// Status the final response must carry.
    pub fn default_expected_status(self) -> u16 {
        match self {
            Self::Login | Self::CreateTopic => 200,
            Self::LoginWithoutCert => 400,
        }
    }
}

impl std::fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login => write!(f, "login"),
            Self::LoginWithoutCert => write!(f, "login_without_cert"),
            Self::CreateTopic => write!(f, "create_topic"),
        }
    }
}

/// Pass criteria for a scenario run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    /// Upper bound for the 95th percentile iteration duration
    #[serde(default = "default_p95_ms")]
    pub p95_ms: u64,
    /// Minimum share of completed iterations that must pass
    #[serde(default = "default_min_pass_rate")]
    pub min_pass_rate: f64,
    /// Minimum completed iterations as a share of the scheduled target
    #[serde(default = "default_min_iteration_ratio")]
    pub min_iteration_ratio: f64,
}

fn default_p95_ms() -> u64 {
    500
}

fn default_min_pass_rate() -> f64 {
    0.95
}

fn default_min_iteration_ratio() -> f64 {
    0.9
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            p95_ms: default_p95_ms(),
            min_pass_rate: default_min_pass_rate(),
            min_iteration_ratio: default_min_iteration_ratio(),
        }
    }
}

/// Constant-arrival-rate scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario name, used in logs and the report
    #[serde(default = "default_name")]
    pub name: String,
    /// Disabled scenarios are skipped by `run`
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// What each iteration does
    #[serde(default)]
    pub exec: ScenarioKind,
    /// Iterations started per time unit
    #[serde(default = "default_rate")]
    pub rate: u32,
    /// Length of the rate time unit in milliseconds
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,
    /// How long new iterations are started, in seconds
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
    /// Size of the executor pool
    #[serde(default = "default_pre_allocated_vus")]
    pub pre_allocated_vus: usize,
    /// Status to check; defaults per `exec`
    #[serde(default)]
    pub expected_status: Option<u16>,
    /// Pass criteria
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_name() -> String {
    "basic".to_string()
}

fn default_enabled() -> bool {
    true
}

fn default_rate() -> u32 {
    30
}

fn default_time_unit_ms() -> u64 {
    1000
}

fn default_duration_secs() -> u64 {
    15
}

fn default_pre_allocated_vus() -> usize {
    50
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            enabled: default_enabled(),
            exec: ScenarioKind::default(),
            rate: default_rate(),
            time_unit_ms: default_time_unit_ms(),
            duration_secs: default_duration_secs(),
            pre_allocated_vus: default_pre_allocated_vus(),
            expected_status: None,
            thresholds: Thresholds::default(),
        }
    }
}

impl ScenarioConfig {
    /// Create a config for a scenario kind with default load shape.
    #[must_use]
    pub fn new(name: impl Into<String>, exec: ScenarioKind) -> Self {
        Self {
            name: name.into(),
            exec,
            ..Self::default()
        }
    }

    /// Set the arrival rate per second.
    #[must_use]
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self.time_unit_ms = 1000;
        self
    }

    /// Set the duration in seconds.
    #[must_use]
    pub fn with_duration_secs(mut self, secs: u64) -> Self {
        self.duration_secs = secs;
        self
    }

    /// Set the executor pool size.
    #[must_use]
    pub fn with_vus(mut self, vus: usize) -> Self {
        self.pre_allocated_vus = vus;
        self
    }

    /// Status each iteration must end with.
    pub fn expected_status(&self) -> u16 {
        self.expected_status
            .unwrap_or_else(|| self.exec.default_expected_status())
    }

    /// Gap between two scheduled iterations.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms) / self.rate.max(1)
    }

    /// Dispatch window.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    /// Ticks due within `window` of the start; the first is due at zero.
    pub fn due_iterations(&self, window: Duration) -> u64 {
        let interval = self.interval().as_nanos().max(1);
        window.as_nanos().div_ceil(interval) as u64
    }

    /// Iterations the schedule aims for.
    pub fn target_iterations(&self) -> u64 {
        self.due_iterations(self.duration())
    }

    /// Validate ranges.
    pub fn validate(&self) -> Result<()> {
        let field = |name: &str| format!("scenarios.{}.{}", self.name, name);

        if self.rate == 0 {
            return Err(Error::config(field("rate"), "must be positive"));
        }
        if self.time_unit_ms == 0 {
            return Err(Error::config(field("time_unit_ms"), "must be positive"));
        }
        if self.interval().is_zero() {
            return Err(Error::config(
                field("rate"),
                "more than one iteration per nanosecond",
            ));
        }
        if self.duration_secs == 0 {
            return Err(Error::config(field("duration_secs"), "must be positive"));
        }
        if self.pre_allocated_vus == 0 {
            return Err(Error::config(field("pre_allocated_vus"), "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.thresholds.min_pass_rate) {
            return Err(Error::config(
                field("thresholds.min_pass_rate"),
                "must be between 0 and 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.thresholds.min_iteration_ratio) {
            return Err(Error::config(
                field("thresholds.min_iteration_ratio"),
                "must be between 0 and 1",
            ));
        }
        if let Some(status) = self.expected_status {
            if !(100..=599).contains(&status) {
                return Err(Error::config(
                    field("expected_status"),
                    format!("{} is not an HTTP status", status),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_basic_scenario() {
        let config = ScenarioConfig::default();

        assert_eq!(config.exec, ScenarioKind::Login);
        assert_eq!(config.rate, 30);
        assert_eq!(config.duration(), Duration::from_secs(15));
        assert_eq!(config.pre_allocated_vus, 50);
        assert_eq!(config.expected_status(), 200);
        // 33.333333ms ticks from t=0: the last one lands just before 15s
        assert_eq!(config.target_iterations(), 451);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_path_expects_400() {
        let config = ScenarioConfig::new("failed", ScenarioKind::LoginWithoutCert);
        assert_eq!(config.expected_status(), 400);

        let overridden = ScenarioConfig {
            expected_status: Some(401),
            ..config
        };
        assert_eq!(overridden.expected_status(), 401);
    }

    #[test]
    fn test_interval() {
        let config = ScenarioConfig::default().with_rate(4);
        assert_eq!(config.interval(), Duration::from_millis(250));

        let per_minute = ScenarioConfig {
            rate: 60,
            time_unit_ms: 60_000,
            ..ScenarioConfig::default()
        };
        assert_eq!(per_minute.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_due_iterations() {
        let config = ScenarioConfig::default().with_rate(100);

        assert_eq!(config.due_iterations(Duration::ZERO), 0);
        assert_eq!(config.due_iterations(Duration::from_millis(1)), 1);
        assert_eq!(config.due_iterations(Duration::from_millis(10)), 1);
        assert_eq!(config.due_iterations(Duration::from_millis(11)), 2);
        assert_eq!(config.with_duration_secs(1).target_iterations(), 100);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let err = ScenarioConfig::default().with_rate(0).validate().unwrap_err();
        assert!(err.to_string().contains("scenarios.basic.rate"));

        assert!(ScenarioConfig::default().with_vus(0).validate().is_err());
        assert!(ScenarioConfig::default()
            .with_duration_secs(0)
            .validate()
            .is_err());

        let bad_status = ScenarioConfig {
            expected_status: Some(42),
            ..ScenarioConfig::default()
        };
        assert!(bad_status.validate().is_err());

        let bad_ratio = ScenarioConfig {
            thresholds: Thresholds {
                min_iteration_ratio: 1.5,
                ..Thresholds::default()
            },
            ..ScenarioConfig::default()
        };
        assert!(bad_ratio.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ScenarioConfig =
            serde_json::from_str(r#"{"name":"failed","exec":"login_without_cert","enabled":false}"#)
                .unwrap();

        assert_eq!(config.exec, ScenarioKind::LoginWithoutCert);
        assert!(!config.enabled);
        assert_eq!(config.rate, 30);
        assert_eq!(config.thresholds.p95_ms, 500);
    }
}
