//! Cross-ward summary for one time window.
//!
//! Eligibility minimums keep tiny wards from dominating the spotlight
//! cards: a ward with three complaints and one closure should not be
//! crowned fastest-resolving. The minimums are policy, not correctness.

use civic_pulse_analytics_models::{
    ChangeSpotlight, CityPulse, FrustrationSpotlight, ResolutionSpotlight, WardStats,
};

/// Minimum current complaints for resolution-rate eligibility.
pub const MIN_COMPLAINTS_FOR_RESOLUTION: u64 = 10;
/// Minimum current complaints for spike eligibility.
pub const MIN_COMPLAINTS_FOR_SPIKE: u64 = 20;
/// Minimum previous-period complaints for improvement eligibility.
pub const MIN_PREVIOUS_FOR_IMPROVEMENT: u64 = 20;

/// Builds the city-wide summary from one window's ward set, or `None`
/// when the window is empty.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn city_pulse(wards: &[WardStats]) -> Option<CityPulse> {
    let most_frustrated = wards.iter().reduce(|best, w| {
        if w.frustration_score > best.frustration_score {
            w
        } else {
            best
        }
    })?;

    let fastest_resolution = wards
        .iter()
        .filter(|w| w.metrics.total_complaints >= MIN_COMPLAINTS_FOR_RESOLUTION)
        .reduce(|best, w| {
            if w.metrics.resolution_rate_percent > best.metrics.resolution_rate_percent {
                w
            } else {
                best
            }
        })
        .or_else(|| wards.first());

    let mut sudden_spike: Option<ChangeSpotlight> = None;
    let mut max_spike = 0.0_f64;
    for w in wards.iter().filter(|w| {
        w.metrics.total_complaints >= MIN_COMPLAINTS_FOR_SPIKE && w.metrics.previous_period_total > 0
    }) {
        let previous = w.metrics.previous_period_total as f64;
        let change = (w.metrics.total_complaints as f64 - previous) / previous * 100.0;
        if change > max_spike {
            max_spike = change;
            sudden_spike = Some(change_spotlight(w, change.round() as i64));
        }
    }

    let mut most_improved: Option<ChangeSpotlight> = None;
    let mut max_improvement = 0.0_f64;
    for w in wards
        .iter()
        .filter(|w| w.metrics.previous_period_total >= MIN_PREVIOUS_FOR_IMPROVEMENT)
    {
        let previous = w.metrics.previous_period_total as f64;
        let change = (previous - w.metrics.total_complaints as f64) / previous * 100.0;
        if change > max_improvement {
            max_improvement = change;
            most_improved = Some(change_spotlight(w, -(change.round() as i64)));
        }
    }

    let city_avg_resolution_rate = (wards
        .iter()
        .map(|w| w.metrics.resolution_rate_percent)
        .sum::<f64>()
        / wards.len() as f64
        * 10.0)
        .round()
        / 10.0;

    Some(CityPulse {
        most_frustrated: FrustrationSpotlight {
            ward_name: most_frustrated.metrics.ward_name.clone(),
            ward_no: most_frustrated.metrics.ward_no,
            frustration_score: most_frustrated.frustration_score,
            top_issue: most_frustrated.metrics.dominant_category.clone(),
            total_complaints: most_frustrated.metrics.total_complaints,
        },
        fastest_resolution: fastest_resolution.map(|w| ResolutionSpotlight {
            ward_name: w.metrics.ward_name.clone(),
            ward_no: w.metrics.ward_no,
            resolution_rate_percent: w.metrics.resolution_rate_percent,
            total_complaints: w.metrics.total_complaints,
        }),
        sudden_spike,
        most_improved,
        city_avg_resolution_rate,
    })
}

fn change_spotlight(w: &WardStats, change_percent: i64) -> ChangeSpotlight {
    ChangeSpotlight {
        ward_name: w.metrics.ward_name.clone(),
        ward_no: w.metrics.ward_no,
        change_percent,
        current_total: w.metrics.total_complaints,
        previous_total: w.metrics.previous_period_total,
    }
}
