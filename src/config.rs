use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Tunable intervals and thresholds for the live-sync services.
///
/// Stored as plain milliseconds so the on-disk JSON stays obvious; code
/// should go through the `Duration` accessors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncConfig {
    /// Period of the user-list feed.
    pub update_interval_ms: u64,
    /// Period of the aggregate-stats feed.
    pub stats_interval_ms: u64,
    /// Quiet period before a non-empty search query hits the data source.
    pub search_debounce_ms: u64,
    /// Window after which a member with no recorded activity counts as
    /// inactive. Single source of truth: every status computation takes it
    /// from here rather than hard-coding a value.
    pub inactivity_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: 10_000,
            stats_interval_ms: 30_000,
            search_debounce_ms: 300,
            inactivity_timeout_ms: 24 * 60 * 60 * 1000,
        }
    }
}

impl SyncConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn stats_interval(&self) -> Duration {
        Duration::from_millis(self.stats_interval_ms)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn inactivity_timeout(&self) -> Duration {
        Duration::from_millis(self.inactivity_timeout_ms)
    }

    pub fn config_file_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_dir = dirs::config_dir().ok_or("could not locate the user config directory")?;
        let app_config_dir = config_dir.join("roster-core");
        std::fs::create_dir_all(&app_config_dir)?;
        Ok(app_config_dir.join("config.json"))
    }

    /// Loads the configuration from disk, falling back to defaults (and
    /// best-effort writing them out) when the file is missing or invalid.
    pub fn load() -> Self {
        match Self::load_from_file() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "could not load sync config, using defaults");
                let defaults = Self::default();
                if let Err(save_err) = defaults.save() {
                    warn!(error = %save_err, "could not save default sync config");
                }
                defaults
            }
        }
    }

    fn load_from_file() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let contents = std::fs::read_to_string(config_path)?;
        let config: SyncConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let config_path = Self::config_file_path()?;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, json)?;
        Ok(())
    }
}
