#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TOML configuration for the civic-pulse services.
//!
//! Ships with an embedded default configuration (`default.toml`); set
//! the `CIVIC_PULSE_CONFIG` environment variable to load a different
//! file of the same shape. Every field has a serde default, so override
//! files only need the sections they change.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

/// Embedded default configuration.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default.toml");

/// Environment variable naming an override configuration file.
pub const CONFIG_ENV_VAR: &str = "CIVIC_PULSE_CONFIG";

/// Color used for category keys absent from the display table.
pub const DEFAULT_CATEGORY_COLOR: &str = "#94a3b8";

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The override file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The TOML failed to parse.
    #[error("TOML error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_owned(),
            port: 3001,
        }
    }
}

/// Datastore client settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatastoreConfig {
    /// API base URL (the segment before `/datastore_search`).
    pub base_url: String,
    /// Records per page.
    pub page_size: u32,
    /// Maximum in-flight requests.
    pub max_concurrency: usize,
    /// Maximum retries after a rate-limit response.
    pub retry_limit: u32,
    /// Base backoff in seconds; the n-th retry waits n times this.
    pub retry_base_secs: u64,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://data.opencity.in/api/3/action".to_owned(),
            page_size: 1000,
            max_concurrency: 8,
            retry_limit: 3,
            retry_base_secs: 2,
        }
    }
}

/// Data source identifiers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Grievance dataset resource IDs, all fetched every cycle.
    pub grievance_resources: Vec<String>,
    /// Pothole-count resource ID.
    pub pothole_resource: String,
    /// Ward boundary `GeoJSON` URL.
    pub ward_geometry_url: String,
}

/// Refresh scheduler settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Minutes between full-refresh cycles.
    pub interval_minutes: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 15,
        }
    }
}

/// Scoring-related category sets.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Source categories counted as streetlight faults.
    pub streetlight_categories: Vec<String>,
}

/// Display metadata for one source category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryDisplay {
    /// Category key exactly as the source data spells it.
    pub key: String,
    /// Short display label.
    pub label: String,
    /// Display color, hex.
    pub color: String,
}

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Datastore client settings.
    pub datastore: DatastoreConfig,
    /// Data source identifiers.
    pub sources: SourcesConfig,
    /// Refresh scheduler settings.
    pub refresh: RefreshConfig,
    /// Scoring-related category sets.
    pub scoring: ScoringConfig,
    /// Manual ward-name overrides, keyed by exact raw source spelling.
    pub ward_name_overrides: BTreeMap<String, String>,
    /// Category display table.
    pub categories: Vec<CategoryDisplay>,
}

impl Config {
    /// Loads configuration from the `CIVIC_PULSE_CONFIG` file if set,
    /// otherwise from the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the override file cannot be read or
    /// either source fails to parse.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::from_file(&path),
            Err(_) => Self::embedded(),
        }
    }

    /// Parses the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the embedded TOML is invalid;
    /// a test guards against that.
    pub fn embedded() -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(DEFAULT_CONFIG_TOML)?)
    }

    /// Parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(&std::fs::read_to_string(path)?)?)
    }

    /// Display metadata for a category key. Keys absent from the table
    /// pass through with the key as label and a neutral color.
    #[must_use]
    pub fn display_for(&self, key: &str) -> CategoryDisplay {
        self.categories
            .iter()
            .find(|c| c.key == key)
            .cloned()
            .unwrap_or_else(|| CategoryDisplay {
                key: key.to_owned(),
                label: key.to_owned(),
                color: DEFAULT_CATEGORY_COLOR.to_owned(),
            })
    }

    /// The streetlight category set, for membership checks.
    #[must_use]
    pub fn streetlight_set(&self) -> BTreeSet<String> {
        self.scoring.streetlight_categories.iter().cloned().collect()
    }
}
