#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-ward metric and score types served to the dashboard.
//!
//! [`WardRawMetrics`] is the finalized per-ward, per-window snapshot out
//! of the aggregator; [`WardStats`] adds the population-relative
//! frustration score and is the unit clients consume.

use std::collections::BTreeMap;

use civic_pulse_grievance_models::GrievanceStatus;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Complaint-volume trend versus the trailing comparison period.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Trend {
    /// Current volume exceeds the previous period by more than 10%.
    Rising,
    /// Current volume is below the previous period by more than 10%.
    Falling,
    /// Within the ±10% band, or no previous period to compare against.
    Stable,
}

/// One of a ward's most recent complaints, sampled newest-first up to a
/// fixed cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentComplaint {
    /// Source complaint ID, if the source provided one.
    pub id: Option<String>,
    /// Complaint category, if the source provided one.
    pub category: Option<String>,
    /// Complaint sub-category, if the source provided one.
    pub sub_category: Option<String>,
    /// Filing date, `YYYY-MM-DD`.
    pub date: String,
    /// Lifecycle status.
    pub status: GrievanceStatus,
}

/// Finalized per-ward, per-window metrics before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardRawMetrics {
    /// Canonical ward name.
    pub ward_name: String,
    /// Official ward number (0 if geometry was missing).
    pub ward_no: u32,
    /// Total complaints in the window.
    pub total_complaints: u64,
    /// Complaints still unresolved (registered or reopened).
    pub unresolved_complaints: u64,
    /// Complaints that were reopened.
    pub reopened_complaints: u64,
    /// Complaints closed.
    pub closed_complaints: u64,
    /// Pothole complaints joined from the secondary source.
    pub pothole_complaints: u64,
    /// Complaints in the streetlight category set.
    pub streetlight_complaints: u64,
    /// Ward area in km² (floored when geometry is missing).
    pub area_km2: f64,
    /// Complaint count per category.
    pub category_breakdown: BTreeMap<String, u64>,
    /// Category with the highest count; ties break by first appearance
    /// in the window.
    pub dominant_category: String,
    /// Share of complaints closed, as a percentage with one decimal.
    pub resolution_rate_percent: f64,
    /// Most recent complaints, newest first.
    pub recent_complaints: Vec<RecentComplaint>,
    /// Volume trend versus the trailing comparison period.
    pub trend: Trend,
    /// Total complaints in the trailing comparison period.
    pub previous_period_total: u64,
}

/// [`WardRawMetrics`] plus the composite frustration score. This is what
/// the cache stores and the API serves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardStats {
    /// The underlying metrics.
    #[serde(flatten)]
    pub metrics: WardRawMetrics,
    /// Composite stress score in `[0, 1]`, three decimal places.
    pub frustration_score: f64,
}

/// Spotlight entry for the city's most frustrated ward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrustrationSpotlight {
    /// Canonical ward name.
    pub ward_name: String,
    /// Official ward number.
    pub ward_no: u32,
    /// The ward's frustration score.
    pub frustration_score: f64,
    /// The ward's dominant complaint category.
    pub top_issue: String,
    /// Total complaints in the window.
    pub total_complaints: u64,
}

/// Spotlight entry for the ward resolving complaints fastest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionSpotlight {
    /// Canonical ward name.
    pub ward_name: String,
    /// Official ward number.
    pub ward_no: u32,
    /// Share of complaints closed, percent.
    pub resolution_rate_percent: f64,
    /// Total complaints in the window.
    pub total_complaints: u64,
}

/// Spotlight entry for a period-over-period volume change (spike or
/// improvement).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSpotlight {
    /// Canonical ward name.
    pub ward_name: String,
    /// Official ward number.
    pub ward_no: u32,
    /// Percent change versus the previous period; negative means
    /// improvement.
    pub change_percent: i64,
    /// Total complaints in the current window.
    pub current_total: u64,
    /// Total complaints in the previous period.
    pub previous_total: u64,
}

/// Cross-ward summary for one time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPulse {
    /// Ward with the highest frustration score.
    pub most_frustrated: FrustrationSpotlight,
    /// Ward with the best resolution rate among eligible wards.
    pub fastest_resolution: Option<ResolutionSpotlight>,
    /// Ward with the sharpest period-over-period increase.
    pub sudden_spike: Option<ChangeSpotlight>,
    /// Ward with the sharpest period-over-period decrease.
    pub most_improved: Option<ChangeSpotlight>,
    /// Mean resolution rate across all wards, percent, one decimal.
    pub city_avg_resolution_rate: f64,
}
