#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Canonical ward types derived from municipal boundary geometry.

use serde::{Deserialize, Serialize};

/// A ward from the canonical boundary file.
///
/// The `name` is the single source of truth for ward identity: every
/// free-text ward name in grievance data resolves (or fails to resolve)
/// to exactly one of these. Loaded once per process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalWard {
    /// Official ward name (unique).
    pub name: String,
    /// Official ward number.
    pub ward_no: u32,
    /// Ward area in square kilometres, derived from the boundary polygon.
    pub area_km2: f64,
}
