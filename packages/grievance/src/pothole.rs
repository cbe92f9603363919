//! Pothole complaint counts from the secondary "fix my street" resource.
//!
//! A small dataset (one row per ward) fetched in a single page. Ward
//! names are free text here too and go through the normalizer before any
//! join with grievance data.

use civic_pulse_datastore::DatastoreClient;
use civic_pulse_grievance_models::WardPotholeCount;

/// Source column holding the ward number.
const FIELD_WARD_NO: &str = "Ward #";
/// Source column holding the free-text ward name.
const FIELD_WARD_NAME: &str = "Ward Name";
/// Source column holding the complaint count.
const FIELD_COMPLAINTS: &str = "Complaints";

/// Upper bound on rows fetched; the resource is one row per ward.
const POTHOLE_PAGE_LIMIT: u64 = 1000;

/// Fetches per-ward pothole complaint counts.
///
/// A fetch failure yields an empty list: pothole data enriches the score
/// but is never allowed to fail a refresh cycle.
pub async fn fetch_pothole_counts(
    client: &DatastoreClient,
    resource_id: &str,
) -> Vec<WardPotholeCount> {
    let records = match client.fetch_single_page(resource_id, POTHOLE_PAGE_LIMIT).await {
        Ok(records) => records,
        Err(e) => {
            log::error!("Failed to fetch pothole resource {resource_id}: {e}");
            return Vec::new();
        }
    };

    let counts: Vec<WardPotholeCount> = records
        .iter()
        .filter_map(parse_pothole_row)
        .collect();
    log::info!("Fetched pothole counts for {} wards", counts.len());
    counts
}

/// Parses one pothole row; rows without a ward name are dropped.
fn parse_pothole_row(row: &serde_json::Value) -> Option<WardPotholeCount> {
    let ward_name = row
        .get(FIELD_WARD_NAME)
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_owned();

    let ward_no = numeric_field(row, FIELD_WARD_NO)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);

    Some(WardPotholeCount {
        ward_name,
        ward_no,
        complaints: numeric_field(row, FIELD_COMPLAINTS).unwrap_or(0),
    })
}

/// Reads a field that the source delivers inconsistently as either a
/// number or a numeric string.
fn numeric_field(row: &serde_json::Value, field: &str) -> Option<u64> {
    let value = row.get(field)?;
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_numeric_and_string_counts() {
        let row = json!({"Ward #": "12", "Ward Name": "Shantala Nagar", "Complaints": 42});
        let parsed = parse_pothole_row(&row).unwrap();
        assert_eq!(parsed.ward_no, 12);
        assert_eq!(parsed.complaints, 42);

        let row = json!({"Ward #": 12, "Ward Name": "Shantala Nagar", "Complaints": "42"});
        let parsed = parse_pothole_row(&row).unwrap();
        assert_eq!(parsed.ward_no, 12);
        assert_eq!(parsed.complaints, 42);
    }

    #[test]
    fn drops_row_without_ward_name() {
        let row = json!({"Ward #": 12, "Complaints": 42});
        assert!(parse_pothole_row(&row).is_none());
    }

    #[test]
    fn defaults_missing_numbers_to_zero() {
        let row = json!({"Ward Name": "Shantala Nagar", "Complaints": "n/a"});
        let parsed = parse_pothole_row(&row).unwrap();
        assert_eq!(parsed.ward_no, 0);
        assert_eq!(parsed.complaints, 0);
    }
}
