//! Analysis configuration
//!
//! Loaded from an optional TOML file; every field has a default so an empty
//! file (or no file at all) yields [`AnalysisConfig::default`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default cap on the trace horizon, in ticks
pub const DEFAULT_MAX_HORIZON: u64 = 10_000_000;

/// How CPU reassignments are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ContextSwitchPolicy {
    /// Every entry of any process into RUNNING, first assignment included
    #[default]
    RunningEntries,
    /// Only entries where the CPU changes owner
    Handoffs,
}

/// Configuration for a trace analysis pass
///
/// # Example
/// ```
/// use schedlens::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.horizon_padding, 1);
/// assert!(config.extend_to_horizon);
/// assert_eq!(config.max_horizon, 10_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Counting rule for context switches
    pub context_switch_policy: ContextSwitchPolicy,

    /// Close each live process's last state at the trace horizon
    ///
    /// When false, a process's last event opens no interval, which matches
    /// the legacy dashboards that only paired consecutive events.
    pub extend_to_horizon: bool,

    /// Ticks past the last observed tick where open intervals are closed
    ///
    /// Default: 1
    pub horizon_padding: u64,

    /// Largest horizon a trace may reach before analysis refuses it
    ///
    /// The memory curve and CPU timeline hold one sample per tick up to the
    /// horizon, so this bounds their size. Default: 10_000_000
    pub max_horizon: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            context_switch_policy: ContextSwitchPolicy::RunningEntries,
            extend_to_horizon: true,
            horizon_padding: 1,
            max_horizon: DEFAULT_MAX_HORIZON,
        }
    }
}

impl AnalysisConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, String> {
        let config: AnalysisConfig =
            toml::from_str(text).map_err(|e| format!("Invalid analysis config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {}", path.display(), e))?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.horizon_padding == 0 {
            return Err(
                "horizon_padding must be >= 1 so open intervals keep a positive duration"
                    .to_string(),
            );
        }
        if self.max_horizon == 0 {
            return Err("max_horizon must be >= 1".to_string());
        }
        if usize::try_from(self.max_horizon)
            .ok()
            .and_then(|ticks| ticks.checked_add(1))
            .is_none()
        {
            return Err(format!(
                "max_horizon {} exceeds the addressable tick range",
                self.max_horizon
            ));
        }
        Ok(())
    }
}
