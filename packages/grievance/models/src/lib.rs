#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Core grievance record types shared across the civic-pulse pipeline.
//!
//! All data sources normalize their raw rows into [`ParsedGrievance`]
//! before any aggregation happens. Fields that a source may omit are
//! modeled as `Option` rather than sentinel strings, so downstream code
//! can distinguish "absent" from a value that happens to equal a default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Lifecycle status of a grievance as reported by the source system.
///
/// The source vocabulary is open-ended; anything outside the three known
/// states maps to [`GrievanceStatus::Unknown`].
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
pub enum GrievanceStatus {
    /// Newly filed, not yet acted on.
    Registered,
    /// Closed once, then reopened by the complainant.
    ReOpen,
    /// Resolved and closed.
    Closed,
    /// Any status string the source uses that we do not recognize.
    Unknown,
}

impl GrievanceStatus {
    /// Parses a source status string, mapping unrecognized values to
    /// [`GrievanceStatus::Unknown`] instead of failing.
    #[must_use]
    pub fn from_source(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Unknown)
    }

    /// Whether this status counts as unresolved for aggregation purposes.
    #[must_use]
    pub const fn is_unresolved(self) -> bool {
        matches!(self, Self::Registered | Self::ReOpen)
    }
}

/// A grievance record after parsing and validation.
///
/// Immutable once constructed; lives only for the duration of one
/// aggregation cycle. The ward name is still free text at this point —
/// canonical resolution happens in the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGrievance {
    /// Ward name exactly as the source spelled it.
    pub ward_name: String,
    /// Complaint category, if the source provided one.
    pub category: Option<String>,
    /// Complaint sub-category, if the source provided one.
    pub sub_category: Option<String>,
    /// Lifecycle status.
    pub status: GrievanceStatus,
    /// When the grievance was filed (millisecond precision).
    pub occurred_at: DateTime<Utc>,
    /// Source complaint ID, if the source provided one.
    pub id: Option<String>,
}

/// Per-ward pothole complaint count from the secondary source.
///
/// The ward name is free text and goes through the same normalizer as
/// grievance records before joining.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardPotholeCount {
    /// Ward name exactly as the source spelled it.
    pub ward_name: String,
    /// Ward number as reported by the source (0 if absent).
    pub ward_no: u32,
    /// Number of pothole complaints.
    pub complaints: u64,
}

/// The rolling time windows the pipeline aggregates over.
///
/// Wire names match the dashboard's filter values (`live`, `24h`, `7d`,
/// `30d`, `seasonal`). Anything else is a client input error at the HTTP
/// edge, rejected by the derived `FromStr`.
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
pub enum TimeWindow {
    /// Rolling last 24 hours, refreshed live.
    #[serde(rename = "live")]
    #[strum(serialize = "live")]
    Live,
    /// Rolling last 24 hours.
    #[serde(rename = "24h")]
    #[strum(serialize = "24h")]
    Day,
    /// Rolling last 7 days.
    #[serde(rename = "7d")]
    #[strum(serialize = "7d")]
    Week,
    /// Rolling last 30 days.
    #[serde(rename = "30d")]
    #[strum(serialize = "30d")]
    Month,
    /// Since the start of the current meteorological season.
    #[serde(rename = "seasonal")]
    #[strum(serialize = "seasonal")]
    Seasonal,
}

impl TimeWindow {
    /// All supported windows, in refresh order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Live,
            Self::Day,
            Self::Week,
            Self::Month,
            Self::Seasonal,
        ]
    }

    /// Fixed window duration, or `None` for [`TimeWindow::Seasonal`] whose
    /// start is a calendar boundary rather than a fixed offset.
    #[must_use]
    pub fn fixed_duration(self) -> Option<chrono::Duration> {
        match self {
            Self::Live | Self::Day => Some(chrono::Duration::hours(24)),
            Self::Week => Some(chrono::Duration::days(7)),
            Self::Month => Some(chrono::Duration::days(30)),
            Self::Seasonal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses() {
        assert_eq!(
            GrievanceStatus::from_source("Registered"),
            GrievanceStatus::Registered
        );
        assert_eq!(
            GrievanceStatus::from_source("ReOpen"),
            GrievanceStatus::ReOpen
        );
        assert_eq!(
            GrievanceStatus::from_source("Closed"),
            GrievanceStatus::Closed
        );
    }

    #[test]
    fn unknown_status_maps_to_unknown() {
        assert_eq!(
            GrievanceStatus::from_source("In Progress"),
            GrievanceStatus::Unknown
        );
        assert_eq!(GrievanceStatus::from_source(""), GrievanceStatus::Unknown);
    }

    #[test]
    fn unresolved_statuses() {
        assert!(GrievanceStatus::Registered.is_unresolved());
        assert!(GrievanceStatus::ReOpen.is_unresolved());
        assert!(!GrievanceStatus::Closed.is_unresolved());
        assert!(!GrievanceStatus::Unknown.is_unresolved());
    }

    #[test]
    fn window_round_trips_wire_names() {
        for window in TimeWindow::all() {
            let name = window.to_string();
            assert_eq!(name.parse::<TimeWindow>().ok(), Some(*window));
        }
    }

    #[test]
    fn rejects_unknown_window() {
        assert!("48h".parse::<TimeWindow>().is_err());
        assert!("".parse::<TimeWindow>().is_err());
    }

    #[test]
    fn live_and_day_share_duration() {
        assert_eq!(
            TimeWindow::Live.fixed_duration(),
            TimeWindow::Day.fixed_duration()
        );
        assert_eq!(TimeWindow::Seasonal.fixed_duration(), None);
    }
}
