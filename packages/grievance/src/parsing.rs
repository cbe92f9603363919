//! Parsing of raw datastore rows into [`ParsedGrievance`] records.
//!
//! Data-quality problems are never fatal: rows with a missing ward name
//! or an unparseable timestamp are dropped and counted, everything else
//! is defaulted field-by-field.

use chrono::{DateTime, NaiveDateTime, Utc};
use civic_pulse_grievance_models::{GrievanceStatus, ParsedGrievance};

/// Source column holding the free-text ward name.
pub const FIELD_WARD_NAME: &str = "Ward Name";
/// Source column holding the complaint category.
pub const FIELD_CATEGORY: &str = "Category";
/// Source column holding the complaint sub-category.
pub const FIELD_SUB_CATEGORY: &str = "Sub Category";
/// Source column holding the lifecycle status.
pub const FIELD_STATUS: &str = "Grievance Status";
/// Source column holding the filing timestamp.
pub const FIELD_DATE: &str = "Grievance Date";
/// Source column holding the complaint ID.
pub const FIELD_ID: &str = "Complaint ID";

/// Aggregate counters for one parse pass. Dropped rows are diagnostic
/// signals, not errors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    /// Raw rows seen.
    pub raw: u64,
    /// Rows successfully parsed.
    pub parsed: u64,
    /// Rows dropped for a missing or empty ward name.
    pub missing_ward: u64,
    /// Rows dropped for a missing or unparseable timestamp.
    pub bad_timestamp: u64,
}

/// Parses a datastore timestamp like `"2024-12-31 05:52:00.000000000"`,
/// truncating any sub-millisecond precision.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), "%Y-%m-%d %H:%M:%S%.f").ok()?;
    DateTime::from_timestamp_millis(naive.and_utc().timestamp_millis())
}

/// Converts one raw datastore row into a [`ParsedGrievance`], updating
/// `stats`. Returns `None` for rows that fail validation.
#[must_use]
pub fn parse_record(row: &serde_json::Value, stats: &mut ParseStats) -> Option<ParsedGrievance> {
    stats.raw += 1;

    let Some(ward_name) = string_field(row, FIELD_WARD_NAME) else {
        stats.missing_ward += 1;
        return None;
    };

    let Some(occurred_at) = row
        .get(FIELD_DATE)
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp)
    else {
        stats.bad_timestamp += 1;
        return None;
    };

    let status = row
        .get(FIELD_STATUS)
        .and_then(serde_json::Value::as_str)
        .map_or(GrievanceStatus::Unknown, GrievanceStatus::from_source);

    stats.parsed += 1;
    Some(ParsedGrievance {
        ward_name,
        category: string_field(row, FIELD_CATEGORY),
        sub_category: string_field(row, FIELD_SUB_CATEGORY),
        status,
        occurred_at,
        id: string_field(row, FIELD_ID),
    })
}

/// Extracts a trimmed, non-empty string field.
fn string_field(row: &serde_json::Value, field: &str) -> Option<String> {
    row.get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_nanosecond_timestamp_to_millis() {
        let dt = parse_timestamp("2024-12-31 05:52:00.123456789").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-12-31T05:52:00.123+00:00");
    }

    #[test]
    fn parses_timestamp_without_fraction() {
        let dt = parse_timestamp("2024-12-31 05:52:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-12-31T05:52:00+00:00");
    }

    #[test]
    fn rejects_garbage_timestamp() {
        assert!(parse_timestamp("31/12/2024").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn parses_full_record() {
        let row = json!({
            "Ward Name": "Indiranagar",
            "Category": "Electrical",
            "Sub Category": "Street Light not working",
            "Grievance Status": "Closed",
            "Grievance Date": "2025-01-15 10:00:00.000000000",
            "Complaint ID": "C-1",
        });
        let mut stats = ParseStats::default();
        let parsed = parse_record(&row, &mut stats).unwrap();
        assert_eq!(parsed.ward_name, "Indiranagar");
        assert_eq!(parsed.category.as_deref(), Some("Electrical"));
        assert_eq!(parsed.status, GrievanceStatus::Closed);
        assert_eq!(parsed.id.as_deref(), Some("C-1"));
        assert_eq!(stats.parsed, 1);
    }

    #[test]
    fn drops_record_without_ward() {
        let row = json!({
            "Ward Name": "  ",
            "Grievance Date": "2025-01-15 10:00:00",
        });
        let mut stats = ParseStats::default();
        assert!(parse_record(&row, &mut stats).is_none());
        assert_eq!(stats.missing_ward, 1);
        assert_eq!(stats.parsed, 0);
    }

    #[test]
    fn drops_record_with_bad_timestamp() {
        let row = json!({
            "Ward Name": "Indiranagar",
            "Grievance Date": "yesterday",
        });
        let mut stats = ParseStats::default();
        assert!(parse_record(&row, &mut stats).is_none());
        assert_eq!(stats.bad_timestamp, 1);
    }

    #[test]
    fn missing_optional_fields_become_none() {
        let row = json!({
            "Ward Name": "Indiranagar",
            "Grievance Date": "2025-01-15 10:00:00",
        });
        let mut stats = ParseStats::default();
        let parsed = parse_record(&row, &mut stats).unwrap();
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.sub_category, None);
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.status, GrievanceStatus::Unknown);
    }
}
