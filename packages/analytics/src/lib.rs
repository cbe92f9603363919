#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Single-pass multi-window aggregation and frustration scoring.
//!
//! Pure compute over typed rows: given one frozen snapshot of parsed
//! records plus the normalizer and join sources, produces scored
//! [`civic_pulse_analytics_models::WardStats`] for every supported time
//! window, and the cross-ward city summary. No I/O happens here — the
//! pipeline crate owns fetching and cache publication.

pub mod aggregate;
pub mod city;
pub mod score;
pub mod window;

pub use aggregate::aggregate_windows;
pub use city::city_pulse;
pub use score::compute_frustration_scores;
pub use window::{anchor_date, window_start};
