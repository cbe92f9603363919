//! HTTP handler functions for the civic-pulse API.
//!
//! Every handler is a thin read over the stats cache. A cold window
//! answers 202 with a warming body so clients can poll and retry; no
//! handler ever triggers aggregation inline.

use actix_web::{HttpResponse, web};
use civic_pulse_analytics::city_pulse;
use civic_pulse_analytics_models::WardStats;
use civic_pulse_grievance_models::TimeWindow;
use civic_pulse_server_models::{
    ApiCategoryInfo, ApiCityStats, ApiError, ApiHealth, ApiWardStats, ApiWarming, StatsQueryParams,
};

use crate::AppState;

/// Window served when the client does not pass `time`.
const DEFAULT_WINDOW: TimeWindow = TimeWindow::Week;

/// Parses the `time` query parameter, answering 400 for unknown values.
fn parse_window(param: Option<&str>) -> Result<TimeWindow, HttpResponse> {
    match param {
        None => Ok(DEFAULT_WINDOW),
        Some(raw) => raw.parse().map_err(|_| {
            let valid: Vec<String> = TimeWindow::all().iter().map(ToString::to_string).collect();
            HttpResponse::BadRequest().json(ApiError {
                error: format!("Invalid time window {raw:?}. Valid: {}", valid.join(", ")),
            })
        }),
    }
}

/// `GET /api/ward-stats`
///
/// Serves one window's scored ward list, optionally filtered to wards
/// whose category breakdown matches the `category` parameter.
pub async fn ward_stats(
    state: web::Data<AppState>,
    params: web::Query<StatsQueryParams>,
) -> HttpResponse {
    let window = match parse_window(params.time.as_deref()) {
        Ok(window) => window,
        Err(response) => return response,
    };

    let Some(entry) = state.cache.get(window) else {
        return HttpResponse::Accepted().json(ApiWarming::new());
    };

    let mut wards: Vec<WardStats> = entry.wards.as_ref().clone();
    if let Some(category) = params.category.as_deref() {
        let needle = category.to_lowercase();
        wards.retain(|w| {
            w.metrics
                .category_breakdown
                .keys()
                .any(|key| key.to_lowercase().contains(&needle))
        });
    }

    let total_complaints = wards.iter().map(|w| w.metrics.total_complaints).sum();
    HttpResponse::Ok().json(ApiWardStats {
        updated_at: entry.computed_at,
        time_window: window,
        category: params.category.clone(),
        total_complaints,
        wards,
    })
}

/// `GET /api/city-stats`
///
/// Serves the cross-ward summary for one window. A warm-but-empty
/// window answers 503 — there is data service, just no matching data.
pub async fn city_stats(
    state: web::Data<AppState>,
    params: web::Query<StatsQueryParams>,
) -> HttpResponse {
    let window = match parse_window(params.time.as_deref()) {
        Ok(window) => window,
        Err(response) => return response,
    };

    let Some(entry) = state.cache.get(window) else {
        return HttpResponse::Accepted().json(ApiWarming::new());
    };

    city_pulse(&entry.wards).map_or_else(
        || {
            HttpResponse::ServiceUnavailable().json(ApiError {
                error: "No data available for this window.".to_owned(),
            })
        },
        |pulse| {
            HttpResponse::Ok().json(ApiCityStats {
                updated_at: entry.computed_at,
                time_window: window,
                pulse,
            })
        },
    )
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "ok".to_owned(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        cached_windows: state.cache.warm_windows(),
        timestamp: chrono::Utc::now(),
    })
}

/// `GET /api/categories`
///
/// Returns the configured category display table.
pub async fn categories(state: web::Data<AppState>) -> HttpResponse {
    let table: Vec<ApiCategoryInfo> = state
        .config
        .categories
        .iter()
        .map(|c| ApiCategoryInfo {
            key: c.key.clone(),
            label: c.label.clone(),
            color: c.color.clone(),
        })
        .collect();
    HttpResponse::Ok().json(table)
}
