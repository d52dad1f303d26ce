//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use punch_core::{ObservationLanguage, PeriodPolicy};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// Period boundaries for single-device uploads.
    #[serde(default = "default_single_device_policy")]
    pub single_device_policy: PeriodPolicy,

    /// Period boundaries for consolidated (two-device) runs.
    #[serde(default = "default_consolidated_policy")]
    pub consolidated_policy: PeriodPolicy,

    /// Language observations are stored and printed in.
    #[serde(default)]
    pub observation_language: ObservationLanguage,
}

const fn default_single_device_policy() -> PeriodPolicy {
    PeriodPolicy::SingleDevice
}

const fn default_consolidated_policy() -> PeriodPolicy {
    PeriodPolicy::Consolidated
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("single_device_policy", &self.single_device_policy)
            .field("consolidated_policy", &self.consolidated_policy)
            .field("observation_language", &self.observation_language)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("punch.db"),
            single_device_policy: default_single_device_policy(),
            consolidated_policy: default_consolidated_policy(),
            observation_language: ObservationLanguage::default(),
        }
    }
}

impl Config {
    /// Creates a configuration with default policies for the given database.
    pub fn with_database(database_path: PathBuf) -> Self {
        Self {
            database_path,
            ..Self::default()
        }
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PUNCH_*)
        figment = figment.merge(Env::prefixed("PUNCH_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for punch.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("punch"))
}

/// Returns the platform-specific data directory for punch.
///
/// On Linux: `~/.local/share/punch`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("punch"))
}
