#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the civic-pulse server.
//!
//! These types are serialized to JSON for the REST API. They are
//! separate from the pipeline's internal types so the API contract can
//! evolve independently.

use chrono::{DateTime, Utc};
use civic_pulse_analytics_models::{CityPulse, WardStats};
use civic_pulse_grievance_models::TimeWindow;
use serde::{Deserialize, Serialize};

/// Query parameters shared by the stats endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct StatsQueryParams {
    /// Time window identifier (`live`, `24h`, `7d`, `30d`, `seasonal`).
    /// Defaults to `7d`.
    pub time: Option<String>,
    /// Optional category filter; matched case-insensitively against
    /// each ward's category breakdown.
    pub category: Option<String>,
}

/// Response for `GET /api/ward-stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWardStats {
    /// When the serving cycle finished.
    pub updated_at: DateTime<Utc>,
    /// The requested window.
    pub time_window: TimeWindow,
    /// The category filter applied, if any.
    pub category: Option<String>,
    /// Sum of complaints across the returned wards.
    pub total_complaints: u64,
    /// Scored wards, frustration-first.
    pub wards: Vec<WardStats>,
}

/// Response for `GET /api/city-stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCityStats {
    /// When the serving cycle finished.
    pub updated_at: DateTime<Utc>,
    /// The requested window.
    pub time_window: TimeWindow,
    /// The cross-ward summary.
    #[serde(flatten)]
    pub pulse: CityPulse,
}

/// 202 body while a requested window is still cold. Distinct from an
/// empty-but-computed window, which serves normally with zero wards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWarming {
    /// Always `true`; presence of this field is the warming signal.
    pub warming: bool,
    /// Human-readable hint.
    pub message: String,
}

impl ApiWarming {
    /// The standard warming body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            warming: true,
            message: "Aggregation in progress. Please retry shortly.".to_owned(),
        }
    }
}

impl Default for ApiWarming {
    fn default() -> Self {
        Self::new()
    }
}

/// Error body for client input errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Service status string.
    pub status: String,
    /// Service version.
    pub version: String,
    /// Windows with at least one completed aggregation.
    pub cached_windows: Vec<TimeWindow>,
    /// Server time.
    pub timestamp: DateTime<Utc>,
}

/// One row of the category display table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategoryInfo {
    /// Category key exactly as the source data spells it.
    pub key: String,
    /// Short display label.
    pub label: String,
    /// Display color, hex.
    pub color: String,
}
