//! Frustration score computation.
//!
//! The score is population-relative: each raw signal is normalized
//! across the window's full ward set before weighting, so a ward's score
//! only means something next to its peers from the same window.

use civic_pulse_analytics_models::{WardRawMetrics, WardStats};

/// Weight of complaint density (complaints per km²).
pub const WEIGHT_COMPLAINT_DENSITY: f64 = 0.40;
/// Weight of the unresolved-complaint ratio.
pub const WEIGHT_UNRESOLVED_RATIO: f64 = 0.30;
/// Weight of pothole density.
pub const WEIGHT_POTHOLE_DENSITY: f64 = 0.20;
/// Weight of streetlight-fault density.
pub const WEIGHT_STREETLIGHT_DENSITY: f64 = 0.10;

/// Area floor in km² for density signals, preventing division blow-ups
/// on missing or sliver geometries.
pub const MIN_AREA_KM2: f64 = 0.5;

/// Computes frustration scores for one window's full ward set and
/// returns the wards sorted by score, descending (stable on ties).
///
/// Density signals are clipped to the population's 99th percentile
/// before min-max scaling so a single extreme ward cannot flatten
/// everyone else; the unresolved ratio is already bounded and scales
/// unclipped. A signal with zero variance contributes 0 for every ward.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn compute_frustration_scores(wards: Vec<WardRawMetrics>) -> Vec<WardStats> {
    if wards.is_empty() {
        return Vec::new();
    }

    let complaint_density: Vec<f64> = wards
        .iter()
        .map(|w| w.total_complaints as f64 / w.area_km2.max(MIN_AREA_KM2))
        .collect();
    let unresolved_ratio: Vec<f64> = wards
        .iter()
        .map(|w| {
            if w.total_complaints > 0 {
                w.unresolved_complaints as f64 / w.total_complaints as f64
            } else {
                0.0
            }
        })
        .collect();
    let pothole_density: Vec<f64> = wards
        .iter()
        .map(|w| w.pothole_complaints as f64 / w.area_km2.max(MIN_AREA_KM2))
        .collect();
    let streetlight_density: Vec<f64> = wards
        .iter()
        .map(|w| w.streetlight_complaints as f64 / w.area_km2.max(MIN_AREA_KM2))
        .collect();

    let norm_density = min_max_normalize(&complaint_density, true);
    let norm_unresolved = min_max_normalize(&unresolved_ratio, false);
    let norm_potholes = min_max_normalize(&pothole_density, true);
    let norm_streetlight = min_max_normalize(&streetlight_density, true);

    let mut stats: Vec<WardStats> = wards
        .into_iter()
        .enumerate()
        .map(|(i, metrics)| {
            let score = norm_density[i] * WEIGHT_COMPLAINT_DENSITY
                + norm_unresolved[i] * WEIGHT_UNRESOLVED_RATIO
                + norm_potholes[i] * WEIGHT_POTHOLE_DENSITY
                + norm_streetlight[i] * WEIGHT_STREETLIGHT_DENSITY;
            WardStats {
                metrics,
                frustration_score: (score * 1000.0).round() / 1000.0,
            }
        })
        .collect();

    stats.sort_by(|a, b| b.frustration_score.total_cmp(&a.frustration_score));
    stats
}

/// Min-max scales `values` to `[0, 1]`, optionally clipping at the 99th
/// percentile first. A constant population maps to all zeros.
fn min_max_normalize(values: &[f64], clip_outliers: bool) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let cap = if clip_outliers {
        percentile99(values)
    } else {
        values.iter().copied().fold(f64::MIN, f64::max)
    };
    let clipped: Vec<f64> = values.iter().map(|v| v.min(cap)).collect();
    let min = clipped.iter().copied().fold(f64::MAX, f64::min);
    let max = clipped.iter().copied().fold(f64::MIN, f64::max);
    if (max - min).abs() < f64::EPSILON {
        return vec![0.0; values.len()];
    }
    clipped.iter().map(|v| (v - min) / (max - min)).collect()
}

/// 99th percentile by the nearest-rank method.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percentile99(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((sorted.len() as f64) * 0.99).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use civic_pulse_analytics_models::Trend;

    fn metrics(name: &str, total: u64, unresolved: u64, area: f64) -> WardRawMetrics {
        WardRawMetrics {
            ward_name: name.to_owned(),
            ward_no: 0,
            total_complaints: total,
            unresolved_complaints: unresolved,
            reopened_complaints: 0,
            closed_complaints: total - unresolved,
            pothole_complaints: 0,
            streetlight_complaints: 0,
            area_km2: area,
            category_breakdown: BTreeMap::new(),
            dominant_category: "Unknown".to_owned(),
            resolution_rate_percent: 0.0,
            recent_complaints: Vec::new(),
            trend: Trend::Stable,
            previous_period_total: 0,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let sum = WEIGHT_COMPLAINT_DENSITY
            + WEIGHT_UNRESOLVED_RATIO
            + WEIGHT_POTHOLE_DENSITY
            + WEIGHT_STREETLIGHT_DENSITY;
        assert!((sum - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_wards_all_score_zero() {
        // Every signal has zero variance, so no ward is "more stressed"
        // than any other.
        let wards = vec![
            metrics("A", 50, 25, 2.0),
            metrics("B", 50, 25, 2.0),
            metrics("C", 50, 25, 2.0),
        ];
        let scored = compute_frustration_scores(wards);
        for ward in &scored {
            assert!((ward.frustration_score - 0.0).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn busier_denser_ward_scores_higher() {
        let wards = vec![
            metrics("Quiet", 10, 1, 5.0),
            metrics("Stressed", 500, 400, 1.0),
        ];
        let scored = compute_frustration_scores(wards);
        assert_eq!(scored[0].metrics.ward_name, "Stressed");
        assert!(scored[0].frustration_score > scored[1].frustration_score);
    }

    #[test]
    fn proportional_growth_preserves_ordering() {
        let base = vec![
            metrics("A", 100, 40, 2.0),
            metrics("B", 60, 30, 1.5),
            metrics("C", 20, 5, 3.0),
        ];
        let tripled: Vec<WardRawMetrics> = base
            .iter()
            .cloned()
            .map(|mut w| {
                w.total_complaints *= 3;
                w.unresolved_complaints *= 3;
                w.closed_complaints *= 3;
                w
            })
            .collect();

        let order = |scored: &[WardStats]| {
            scored
                .iter()
                .map(|w| w.metrics.ward_name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(
            order(&compute_frustration_scores(base)),
            order(&compute_frustration_scores(tripled))
        );
    }

    #[test]
    fn scores_are_rounded_to_three_decimals() {
        let wards = vec![metrics("A", 100, 33, 1.0), metrics("B", 10, 1, 1.0)];
        for ward in compute_frustration_scores(wards) {
            let scaled = ward.frustration_score * 1000.0;
            assert!((scaled - scaled.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn scoring_is_deterministic() {
        let build = || {
            vec![
                metrics("A", 100, 40, 2.0),
                metrics("B", 60, 30, 1.5),
                metrics("C", 20, 5, 3.0),
            ]
        };
        let first = compute_frustration_scores(build());
        let second = compute_frustration_scores(build());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.metrics.ward_name, b.metrics.ward_name);
            assert!((a.frustration_score - b.frustration_score).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn zero_area_uses_floor_not_infinity() {
        let wards = vec![metrics("A", 100, 10, 0.0), metrics("B", 10, 1, 1.0)];
        let scored = compute_frustration_scores(wards);
        for ward in &scored {
            assert!(ward.frustration_score.is_finite());
        }
    }

    #[test]
    fn normalize_handles_constant_input() {
        assert_eq!(min_max_normalize(&[3.0, 3.0, 3.0], false), vec![0.0; 3]);
    }

    #[test]
    fn percentile_clip_bounds_outliers() {
        // 200 values: 199 ones and one huge outlier. The outlier is
        // clipped down to the 99th percentile (1.0), leaving a
        // zero-variance population that normalizes to all zeros.
        let mut values = vec![1.0; 199];
        values.push(1_000_000.0);
        let normalized = min_max_normalize(&values, true);
        assert!((normalized[0] - 0.0).abs() < f64::EPSILON);
        assert!((normalized[199] - 0.0).abs() < f64::EPSILON);
    }
}
