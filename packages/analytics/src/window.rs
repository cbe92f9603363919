//! Time-window boundary computation.
//!
//! Windows are anchored to the dataset's own timeline when the source is
//! a stale snapshot: filtering a months-old export against "today" would
//! produce empty windows for every ward.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use civic_pulse_grievance_models::{ParsedGrievance, TimeWindow};

/// How far behind wall-clock the dataset's newest record may be before
/// windows anchor to the dataset instead of to now. Policy constant.
pub const STALE_ANCHOR_DAYS: i64 = 7;

/// Picks the anchor every window of one cycle is computed against: the
/// dataset's maximum observed record date if that date is more than
/// [`STALE_ANCHOR_DAYS`] old, otherwise wall-clock now.
#[must_use]
pub fn anchor_date(records: &[ParsedGrievance], now: DateTime<Utc>) -> DateTime<Utc> {
    match records.iter().map(|r| r.occurred_at).max() {
        Some(max) if now - max > Duration::days(STALE_ANCHOR_DAYS) => max,
        _ => now,
    }
}

/// Start of the given window ending at `anchor`.
#[must_use]
pub fn window_start(window: TimeWindow, anchor: DateTime<Utc>) -> DateTime<Utc> {
    window
        .fixed_duration()
        .map_or_else(|| season_start(anchor), |duration| anchor - duration)
}

/// Start of the meteorological season containing `anchor`: summer from
/// March, monsoon from June, post-monsoon from November, winter from
/// January.
fn season_start(anchor: DateTime<Utc>) -> DateTime<Utc> {
    let start_month = match anchor.month() {
        3..=5 => 3,
        6..=10 => 6,
        11 | 12 => 11,
        _ => 1,
    };
    NaiveDate::from_ymd_opt(anchor.year(), start_month, 1)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map_or(anchor, |naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_pulse_grievance_models::GrievanceStatus;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn record_at(date: &str) -> ParsedGrievance {
        ParsedGrievance {
            ward_name: "Indiranagar".to_owned(),
            category: None,
            sub_category: None,
            status: GrievanceStatus::Registered,
            occurred_at: utc(date),
            id: None,
        }
    }

    #[test]
    fn anchors_to_now_for_fresh_data() {
        let now = utc("2025-06-15T12:00:00Z");
        let records = vec![record_at("2025-06-14T00:00:00Z")];
        assert_eq!(anchor_date(&records, now), now);
    }

    #[test]
    fn anchors_to_dataset_max_for_stale_snapshot() {
        let now = utc("2025-06-15T12:00:00Z");
        let records = vec![
            record_at("2025-01-10T00:00:00Z"),
            record_at("2025-03-01T08:30:00Z"),
        ];
        assert_eq!(anchor_date(&records, now), utc("2025-03-01T08:30:00Z"));
    }

    #[test]
    fn anchors_to_now_for_empty_dataset() {
        let now = utc("2025-06-15T12:00:00Z");
        assert_eq!(anchor_date(&[], now), now);
    }

    #[test]
    fn fixed_windows_subtract_their_duration() {
        let anchor = utc("2025-06-15T12:00:00Z");
        assert_eq!(
            window_start(TimeWindow::Day, anchor),
            utc("2025-06-14T12:00:00Z")
        );
        assert_eq!(
            window_start(TimeWindow::Week, anchor),
            utc("2025-06-08T12:00:00Z")
        );
        assert_eq!(
            window_start(TimeWindow::Month, anchor),
            utc("2025-05-16T12:00:00Z")
        );
    }

    #[test]
    fn seasonal_window_snaps_to_season_boundaries() {
        assert_eq!(
            window_start(TimeWindow::Seasonal, utc("2025-04-20T00:00:00Z")),
            utc("2025-03-01T00:00:00Z")
        );
        assert_eq!(
            window_start(TimeWindow::Seasonal, utc("2025-08-01T10:00:00Z")),
            utc("2025-06-01T00:00:00Z")
        );
        assert_eq!(
            window_start(TimeWindow::Seasonal, utc("2025-12-31T23:59:59Z")),
            utc("2025-11-01T00:00:00Z")
        );
        assert_eq!(
            window_start(TimeWindow::Seasonal, utc("2025-02-14T00:00:00Z")),
            utc("2025-01-01T00:00:00Z")
        );
    }
}
