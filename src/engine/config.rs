//! Engine configuration file support.
//!
//! Reads engine tuning parameters from a TOML configuration file or from
//! environment variables.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::engine::EngineError;

/// Engine tuning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Minimum regulatory lead time between phase completion and its
    /// inspection, in business days.
    #[serde(default = "default_inspection_lead_days")]
    pub inspection_lead_days: i64,
    /// Time budget for a full analysis run, in seconds. Runs exceeding the
    /// budget fail rather than return partial results.
    #[serde(default = "default_run_budget_secs")]
    pub run_budget_secs: u64,
}

fn default_inspection_lead_days() -> i64 {
    1
}

fn default_run_budget_secs() -> u64 {
    5
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inspection_lead_days: default_inspection_lead_days(),
            run_budget_secs: default_run_budget_secs(),
        }
    }
}

impl EngineConfig {
    /// Load engine configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EngineError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content).map_err(|e| {
            EngineError::Configuration(format!("Failed to parse config file: {}", e))
        })
    }

    /// Load engine configuration from the default locations, falling back
    /// to environment variables, then to defaults.
    ///
    /// Searches for `engine.toml` in the current and parent directory;
    /// `CSI_INSPECTION_LEAD_DAYS` and `CSI_RUN_BUDGET_SECS` override when
    /// set.
    pub fn load() -> Self {
        let search_paths = [PathBuf::from("engine.toml"), PathBuf::from("../engine.toml")];
        let mut config = search_paths
            .iter()
            .find(|p| p.exists())
            .and_then(|p| Self::from_file(p).ok())
            .unwrap_or_default();

        if let Some(days) = std::env::var("CSI_INSPECTION_LEAD_DAYS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.inspection_lead_days = days;
        }
        if let Some(secs) = std::env::var("CSI_RUN_BUDGET_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.run_budget_secs = secs;
        }
        config
    }

    /// The analysis time budget as a `Duration`.
    pub fn run_budget(&self) -> Duration {
        Duration::from_secs(self.run_budget_secs)
    }
}
