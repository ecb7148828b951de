//! Application configuration types

use anyhow::{Context, Result};
use certload_core::{Endpoints, HttpConfig, ScenarioConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod loader;

pub use loader::load_config;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub scenarios: BTreeMap<String, ScenarioConfig>,
}

/// Overrides from the `run` command line.
#[derive(Debug, Clone, Default)]
pub struct ScenarioOverrides {
    pub rate: Option<u32>,
    pub duration_secs: Option<u64>,
    pub vus: Option<usize>,
}

impl AppConfig {
    /// Name each scenario after its table key and validate everything.
    pub fn normalize(mut self) -> Result<Self> {
        for (name, scenario) in self.scenarios.iter_mut() {
            scenario.name = name.clone();
        }
        self.endpoints
            .validate()
            .context("Invalid endpoint configuration")?;
        Ok(self)
    }

    /// Pick the scenarios to run.
    ///
    /// Named scenarios run even when disabled; with no names, every enabled
    /// scenario runs.
    pub fn select(
        &self,
        names: &[String],
        overrides: &ScenarioOverrides,
    ) -> Result<Vec<ScenarioConfig>> {
        let mut selected = if names.is_empty() {
            self.scenarios
                .values()
                .filter(|s| s.enabled)
                .cloned()
                .collect::<Vec<_>>()
        } else {
            names
                .iter()
                .map(|name| {
                    self.scenarios.get(name).cloned().with_context(|| {
                        format!(
                            "Unknown scenario '{}' (configured: {})",
                            name,
                            self.scenarios.keys().cloned().collect::<Vec<_>>().join(", ")
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?
        };

        if selected.is_empty() {
            anyhow::bail!("No enabled scenarios. Enable one in config or pass --scenario.");
        }

        for scenario in &mut selected {
            if let Some(rate) = overrides.rate {
                scenario.rate = rate;
                scenario.time_unit_ms = 1000;
            }
            if let Some(secs) = overrides.duration_secs {
                scenario.duration_secs = secs;
            }
            if let Some(vus) = overrides.vus {
                scenario.pre_allocated_vus = vus;
            }
            scenario
                .validate()
                .with_context(|| format!("Invalid scenario '{}'", scenario.name))?;
        }
        Ok(selected)
    }
}
