#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Warm in-memory store for per-window ward statistics.
//!
//! One entry per time window, replaced wholesale by a completed refresh
//! cycle and read concurrently by request handlers. A window is either
//! cold (never computed) or warm; it never reverts to cold, even when a
//! later cycle fails — readers keep the last good value. The store is an
//! explicit injectable object so tests can construct isolated instances.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use civic_pulse_analytics_models::WardStats;
use civic_pulse_grievance_models::TimeWindow;

/// One window's published aggregation result.
///
/// The ward list sits behind an [`Arc`] so handing a copy to a request
/// handler never clones the payload.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Scored wards, sorted by frustration score descending.
    pub wards: Arc<Vec<WardStats>>,
    /// When the producing cycle finished.
    pub computed_at: DateTime<Utc>,
}

/// Window → entry store with atomic whole-entry replacement.
#[derive(Debug, Default)]
pub struct StatsCache {
    entries: RwLock<BTreeMap<TimeWindow, CacheEntry>>,
}

impl StatsCache {
    /// Creates an empty (all-cold) cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a window's result, replacing any previous entry in one
    /// step. Readers observe either the old entry or the new one, never
    /// a mix.
    pub fn replace(&self, window: TimeWindow, wards: Vec<WardStats>, computed_at: DateTime<Utc>) {
        let entry = CacheEntry {
            wards: Arc::new(wards),
            computed_at,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(window, entry);
    }

    /// Returns the window's entry, or `None` while the window is cold.
    #[must_use]
    pub fn get(&self, window: TimeWindow) -> Option<CacheEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&window)
            .cloned()
    }

    /// Windows that have been computed at least once. Diagnostic signal
    /// for the health endpoint.
    #[must_use]
    pub fn warm_windows(&self) -> Vec<TimeWindow> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;

    use civic_pulse_analytics_models::{Trend, WardRawMetrics};

    fn ward(name: &str, score: f64) -> WardStats {
        WardStats {
            metrics: WardRawMetrics {
                ward_name: name.to_owned(),
                ward_no: 1,
                total_complaints: 1,
                unresolved_complaints: 0,
                reopened_complaints: 0,
                closed_complaints: 1,
                pothole_complaints: 0,
                streetlight_complaints: 0,
                area_km2: 1.0,
                category_breakdown: Map::new(),
                dominant_category: "Lakes".to_owned(),
                resolution_rate_percent: 100.0,
                recent_complaints: Vec::new(),
                trend: Trend::Stable,
                previous_period_total: 0,
            },
            frustration_score: score,
        }
    }

    #[test]
    fn cold_window_reads_none() {
        let cache = StatsCache::new();
        assert!(cache.get(TimeWindow::Week).is_none());
        assert!(cache.warm_windows().is_empty());
    }

    #[test]
    fn replace_warms_a_window() {
        let cache = StatsCache::new();
        let computed_at = Utc::now();
        cache.replace(TimeWindow::Week, vec![ward("Indiranagar", 0.5)], computed_at);

        let entry = cache.get(TimeWindow::Week).unwrap();
        assert_eq!(entry.wards.len(), 1);
        assert_eq!(entry.computed_at, computed_at);
        assert_eq!(cache.warm_windows(), vec![TimeWindow::Week]);
    }

    #[test]
    fn replace_is_whole_entry_not_merge() {
        let cache = StatsCache::new();
        cache.replace(
            TimeWindow::Week,
            vec![ward("Indiranagar", 0.5), ward("Koramangala", 0.4)],
            Utc::now(),
        );
        cache.replace(TimeWindow::Week, vec![ward("Hoodi", 0.9)], Utc::now());

        let entry = cache.get(TimeWindow::Week).unwrap();
        assert_eq!(entry.wards.len(), 1);
        assert_eq!(entry.wards[0].metrics.ward_name, "Hoodi");
    }

    #[test]
    fn windows_are_independent() {
        let cache = StatsCache::new();
        cache.replace(TimeWindow::Day, vec![ward("Indiranagar", 0.5)], Utc::now());

        assert!(cache.get(TimeWindow::Day).is_some());
        assert!(cache.get(TimeWindow::Seasonal).is_none());
    }

    #[test]
    fn empty_result_is_warm_not_cold() {
        // An empty-but-computed window answers differently than a cold
        // one: "no data matched" vs "try again shortly".
        let cache = StatsCache::new();
        cache.replace(TimeWindow::Live, Vec::new(), Utc::now());

        let entry = cache.get(TimeWindow::Live).unwrap();
        assert!(entry.wards.is_empty());
        assert_eq!(cache.warm_windows(), vec![TimeWindow::Live]);
    }
}
