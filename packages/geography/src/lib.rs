#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Ward boundary geometry fetching and area derivation.
//!
//! Loads the municipal ward boundary `GeoJSON`, derives each ward's area
//! in km², and produces the canonical ward list every other component
//! keys on. Ward boundaries change rarely, so callers cache the result
//! for the lifetime of the process.

use std::collections::BTreeMap;
use std::time::Duration;

use civic_pulse_geography_models::CanonicalWard;
use geo::{Area, Coord, LineString, Polygon};

/// Kilometres per degree of latitude.
const LAT_KM: f64 = 111.0;
/// Kilometres per degree of longitude at the city's latitude.
const LNG_KM: f64 = 108.2;

/// HTTP timeout for the boundary file fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while loading ward geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeographyError {
    /// The boundary file could not be fetched.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The boundary file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    Geojson(#[from] geojson::Error),
}

/// Fetches the ward boundary `GeoJSON` and derives the canonical ward
/// list.
///
/// # Errors
///
/// Returns [`GeographyError`] if the fetch fails or the body is not a
/// parseable feature collection.
pub async fn fetch_ward_geometry(url: &str) -> Result<Vec<CanonicalWard>, GeographyError> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
    let body = client.get(url).send().await?.error_for_status()?.text().await?;
    let wards = parse_ward_features(&body)?;
    log::info!("Loaded {} ward geometries", wards.len());
    Ok(wards)
}

/// Parses a boundary feature collection into canonical wards.
///
/// Features with no usable name are skipped. When multiple features
/// share a ward number (split boundaries, revisions), the largest one
/// wins.
///
/// # Errors
///
/// Returns [`GeographyError::Geojson`] if the body is not valid `GeoJSON`.
pub fn parse_ward_features(body: &str) -> Result<Vec<CanonicalWard>, GeographyError> {
    let collection = geojson::FeatureCollection::try_from(body.parse::<geojson::GeoJson>()?)?;

    let mut by_ward_no: BTreeMap<u32, CanonicalWard> = BTreeMap::new();
    for feature in &collection.features {
        let Some(ward) = ward_from_feature(feature) else {
            continue;
        };
        match by_ward_no.get(&ward.ward_no) {
            Some(existing) if existing.area_km2 >= ward.area_km2 => {}
            _ => {
                by_ward_no.insert(ward.ward_no, ward);
            }
        }
    }

    Ok(by_ward_no.into_values().collect())
}

/// Converts one boundary feature, reading both the KGIS and legacy
/// property names.
fn ward_from_feature(feature: &geojson::Feature) -> Option<CanonicalWard> {
    let name = feature
        .property("KGISWardName")
        .or_else(|| feature.property("WARD_NAME"))
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_owned();

    let ward_no = feature
        .property("KGISWardNo")
        .or_else(|| feature.property("WARD_NO"))
        .and_then(numeric_property)
        .unwrap_or(0);

    let geometry = feature.geometry.as_ref()?;
    let area_km2 = feature_area_km2(geometry)?;

    Some(CanonicalWard {
        name,
        ward_no,
        area_km2,
    })
}

/// Reads a property the source delivers as either a number or a numeric
/// string.
fn numeric_property(value: &serde_json::Value) -> Option<u32> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .and_then(|n| u32::try_from(n).ok())
}

/// Area of a boundary geometry in km². Multi-polygons aggregate the area
/// of every constituent polygon's exterior ring.
fn feature_area_km2(geometry: &geojson::Geometry) -> Option<f64> {
    match geo::Geometry::<f64>::try_from(geometry).ok()? {
        geo::Geometry::Polygon(polygon) => Some(polygon_area_km2(&polygon)),
        geo::Geometry::MultiPolygon(multi) => Some(multi.iter().map(polygon_area_km2).sum()),
        _ => None,
    }
}

/// Planar area of the exterior ring after projecting degrees onto a
/// local km grid. Holes are ignored; ward boundaries do not have them.
fn polygon_area_km2(polygon: &Polygon<f64>) -> f64 {
    let scaled: LineString<f64> = polygon
        .exterior()
        .coords()
        .map(|c| Coord {
            x: c.x * LNG_KM,
            y: c.y * LAT_KM,
        })
        .collect();
    Polygon::new(scaled, Vec::new()).unsigned_area()
}
