//! Single-pass multi-window aggregation.
//!
//! The full record set is fetched and parsed exactly once per cycle;
//! every time window is derived from that frozen snapshot by in-memory
//! date filtering. Record volume dominates cycle cost, so nothing here
//! may trigger a second fetch.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use civic_pulse_analytics_models::{RecentComplaint, Trend, WardRawMetrics, WardStats};
use civic_pulse_geography_models::CanonicalWard;
use civic_pulse_grievance_models::{
    GrievanceStatus, ParsedGrievance, TimeWindow, WardPotholeCount,
};
use civic_pulse_normalize::WardNormalizer;

use crate::score::compute_frustration_scores;
use crate::window::{anchor_date, window_start};

/// Cap on the per-ward recent-complaints sample.
pub const MAX_RECENT_COMPLAINTS: usize = 20;

/// Breakdown bucket for records whose source row carried no category.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Area in km² assumed for wards whose geometry is missing.
pub const DEFAULT_AREA_KM2: f64 = 0.5;

/// A ward is trending up once it exceeds the previous period by 10%.
const RISING_FACTOR: f64 = 1.1;
/// A ward is trending down once it drops below the previous period by 10%.
const FALLING_FACTOR: f64 = 0.9;

/// Aggregates and scores every supported time window from one frozen
/// record snapshot.
///
/// Unresolvable ward names are silently excluded (the normalizer records
/// them for diagnostics); pothole counts are resolved through the same
/// normalizer and summed per canonical ward before any window is built.
#[must_use]
pub fn aggregate_windows(
    records: &[ParsedGrievance],
    normalizer: &WardNormalizer,
    potholes: &[WardPotholeCount],
    wards: &[CanonicalWard],
    streetlight_categories: &BTreeSet<String>,
    now: DateTime<Utc>,
) -> BTreeMap<TimeWindow, Vec<WardStats>> {
    let anchor = anchor_date(records, now);
    log::info!("Aggregating {} records, anchor {anchor}", records.len());

    let geo_by_name: BTreeMap<&str, &CanonicalWard> =
        wards.iter().map(|w| (w.name.as_str(), w)).collect();

    let mut potholes_by_ward: BTreeMap<String, u64> = BTreeMap::new();
    for pothole in potholes {
        if let Some(canonical) = normalizer.resolve(&pothole.ward_name) {
            *potholes_by_ward.entry(canonical).or_default() += pothole.complaints;
        }
    }

    let mut out = BTreeMap::new();
    for &window in TimeWindow::all() {
        let start = window_start(window, anchor);
        let duration = anchor - start;
        let prev_start = start - duration;

        // Newest first, so each ward's bounded recent sample reflects
        // true recency.
        let mut current: Vec<&ParsedGrievance> = records
            .iter()
            .filter(|r| r.occurred_at >= start && r.occurred_at < anchor)
            .collect();
        current.sort_by_key(|r| std::cmp::Reverse(r.occurred_at));

        let mut previous_totals: BTreeMap<String, u64> = BTreeMap::new();
        for record in records
            .iter()
            .filter(|r| r.occurred_at >= prev_start && r.occurred_at < start)
        {
            if let Some(canonical) = normalizer.resolve(&record.ward_name) {
                *previous_totals.entry(canonical).or_default() += 1;
            }
        }

        let accumulators = group_by_ward(&current, normalizer, streetlight_categories);
        let metrics = build_metrics(accumulators, &previous_totals, &potholes_by_ward, &geo_by_name);
        let stats = compute_frustration_scores(metrics);

        log::info!(
            "Window {window}: current={}, previous={}, wards={}",
            current.len(),
            previous_totals.values().sum::<u64>(),
            stats.len()
        );
        out.insert(window, stats);
    }
    out
}

/// Running totals for one ward within one window.
#[derive(Debug, Default)]
struct WardAccumulator {
    total: u64,
    unresolved: u64,
    reopened: u64,
    closed: u64,
    streetlight: u64,
    /// Category counts in first-seen order; ties in the dominant
    /// category break toward the earliest-seen one.
    categories: Vec<(String, u64)>,
    recent: Vec<RecentComplaint>,
}

impl WardAccumulator {
    fn add(&mut self, record: &ParsedGrievance, streetlight_categories: &BTreeSet<String>) {
        self.total += 1;
        if record.status.is_unresolved() {
            self.unresolved += 1;
        }
        if record.status == GrievanceStatus::ReOpen {
            self.reopened += 1;
        }
        if record.status == GrievanceStatus::Closed {
            self.closed += 1;
        }

        let category = record.category.as_deref().unwrap_or(UNKNOWN_CATEGORY);
        if record
            .category
            .as_ref()
            .is_some_and(|c| streetlight_categories.contains(c))
        {
            self.streetlight += 1;
        }
        match self.categories.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count += 1,
            None => self.categories.push((category.to_owned(), 1)),
        }

        if self.recent.len() < MAX_RECENT_COMPLAINTS {
            self.recent.push(RecentComplaint {
                id: record.id.clone(),
                category: record.category.clone(),
                sub_category: record.sub_category.clone(),
                date: record.occurred_at.format("%Y-%m-%d").to_string(),
                status: record.status,
            });
        }
    }

    fn dominant_category(&self) -> String {
        let mut dominant = UNKNOWN_CATEGORY;
        let mut max_count = 0;
        for (name, count) in &self.categories {
            if *count > max_count {
                max_count = *count;
                dominant = name;
            }
        }
        dominant.to_owned()
    }
}

/// Groups current-window records by resolved canonical ward name.
fn group_by_ward(
    records: &[&ParsedGrievance],
    normalizer: &WardNormalizer,
    streetlight_categories: &BTreeSet<String>,
) -> BTreeMap<String, WardAccumulator> {
    let mut by_ward: BTreeMap<String, WardAccumulator> = BTreeMap::new();
    for record in records {
        let Some(canonical) = normalizer.resolve(&record.ward_name) else {
            continue;
        };
        by_ward
            .entry(canonical)
            .or_default()
            .add(record, streetlight_categories);
    }
    by_ward
}

/// Finalizes accumulators into raw metrics, joining potholes, geometry,
/// and the trailing-period totals.
fn build_metrics(
    accumulators: BTreeMap<String, WardAccumulator>,
    previous_totals: &BTreeMap<String, u64>,
    potholes_by_ward: &BTreeMap<String, u64>,
    geo_by_name: &BTreeMap<&str, &CanonicalWard>,
) -> Vec<WardRawMetrics> {
    accumulators
        .into_iter()
        .map(|(canonical, acc)| {
            let geo = geo_by_name.get(canonical.as_str());
            let previous = previous_totals.get(&canonical).copied().unwrap_or(0);
            let dominant_category = acc.dominant_category();

            WardRawMetrics {
                ward_no: geo.map_or(0, |g| g.ward_no),
                area_km2: geo.map_or(DEFAULT_AREA_KM2, |g| g.area_km2),
                total_complaints: acc.total,
                unresolved_complaints: acc.unresolved,
                reopened_complaints: acc.reopened,
                closed_complaints: acc.closed,
                pothole_complaints: potholes_by_ward.get(&canonical).copied().unwrap_or(0),
                streetlight_complaints: acc.streetlight,
                category_breakdown: acc.categories.iter().cloned().collect(),
                dominant_category,
                resolution_rate_percent: resolution_rate_percent(acc.closed, acc.total),
                recent_complaints: acc.recent,
                trend: trend_for(acc.total, previous),
                previous_period_total: previous,
                ward_name: canonical,
            }
        })
        .collect()
}

/// Share of complaints closed, as a percentage with one decimal.
#[allow(clippy::cast_precision_loss)]
fn resolution_rate_percent(closed: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (closed as f64 / total as f64 * 1000.0).round() / 10.0
}

/// Classifies the period-over-period volume change.
#[allow(clippy::cast_precision_loss)]
fn trend_for(current: u64, previous: u64) -> Trend {
    if previous == 0 {
        return Trend::Stable;
    }
    let current = current as f64;
    let previous = previous as f64;
    if current > previous * RISING_FACTOR {
        Trend::Rising
    } else if current < previous * FALLING_FACTOR {
        Trend::Falling
    } else {
        Trend::Stable
    }
}
