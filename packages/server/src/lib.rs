#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the civic-pulse dashboard.
//!
//! Serves per-ward and city-level grievance statistics straight from
//! the in-memory stats cache. All aggregation happens in the refresh
//! pipeline, which this binary spawns at startup: one cycle runs
//! immediately, then one per configured interval. Request handlers
//! never block on aggregation — a cold window answers 202 until the
//! first cycle lands.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use civic_pulse_cache::StatsCache;
use civic_pulse_config::Config;
use civic_pulse_pipeline::Pipeline;

/// Shared application state.
pub struct AppState {
    /// The stats cache the refresh pipeline publishes into.
    pub cache: Arc<StatsCache>,
    /// Loaded configuration.
    pub config: Arc<Config>,
}

/// Starts the civic-pulse API server.
///
/// Loads configuration, spawns the refresh pipeline, and serves the
/// REST API. This is a regular async function — the caller provides
/// the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if configuration cannot be loaded or the HTTP client for the
/// pipeline fails to initialize.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = Arc::new(Config::load().expect("Failed to load configuration"));
    let cache = Arc::new(StatsCache::new());

    let pipeline = Arc::new(
        Pipeline::new(Arc::clone(&config), Arc::clone(&cache))
            .expect("Failed to build refresh pipeline"),
    );
    log::info!(
        "Spawning refresh pipeline (every {} minutes)",
        config.refresh.interval_minutes
    );
    let _refresh = pipeline.spawn_refresh();

    let state = web::Data::new(AppState {
        cache,
        config: Arc::clone(&config),
    });

    let bind_addr = config.server.bind_addr.clone();
    let port = config.server.port;
    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/ward-stats", web::get().to(handlers::ward_stats))
                    .route("/city-stats", web::get().to(handlers::city_stats))
                    .route("/categories", web::get().to(handlers::categories)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
