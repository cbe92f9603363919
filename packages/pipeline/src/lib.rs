#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Full-refresh aggregation cycle and interval scheduler.
//!
//! One cycle fetches grievances, pothole counts, and (process-cached)
//! ward geometry concurrently, aggregates every time window from the
//! same frozen snapshot, and publishes each window's result to the
//! cache. Cycles are serialized by an in-flight guard: a refresh firing
//! while another cycle runs queues behind it instead of racing on cache
//! writes.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use civic_pulse_analytics::aggregate_windows;
use civic_pulse_cache::StatsCache;
use civic_pulse_config::Config;
use civic_pulse_datastore::{DatastoreClient, DatastoreError, RetryPolicy};
use civic_pulse_geography::{GeographyError, fetch_ward_geometry};
use civic_pulse_geography_models::CanonicalWard;
use civic_pulse_grievance::{fetch_all_grievances, fetch_pothole_counts};
use civic_pulse_normalize::WardNormalizer;
use tokio::sync::{Mutex, OnceCell};

/// Errors that abort a refresh cycle. An aborted cycle publishes
/// nothing; previously warm cache entries stay untouched.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// Every grievance source failed or returned nothing.
    #[error("no grievance records fetched from any source")]
    NoRecords,

    /// Ward geometry could not be loaded, so no canonical ward list
    /// exists to aggregate against.
    #[error("ward geometry unavailable: {0}")]
    Geography(#[from] GeographyError),
}

/// The refresh pipeline. One instance per process, shared with the
/// scheduler task behind an [`Arc`].
pub struct Pipeline {
    client: DatastoreClient,
    cache: Arc<StatsCache>,
    config: Arc<Config>,
    /// Ward boundaries change rarely; fetched once per process. Stays
    /// unset on fetch failure so the next cycle retries.
    geometry: OnceCell<Vec<CanonicalWard>>,
    /// In-flight-cycle guard.
    cycle_lock: Mutex<()>,
}

impl Pipeline {
    /// Builds a pipeline over the given configuration and cache.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] if the HTTP client fails to
    /// initialize.
    pub fn new(config: Arc<Config>, cache: Arc<StatsCache>) -> Result<Self, DatastoreError> {
        let client = DatastoreClient::new(&config.datastore.base_url)?
            .with_page_size(config.datastore.page_size)
            .with_max_concurrency(config.datastore.max_concurrency)
            .with_retry_policy(RetryPolicy {
                limit: config.datastore.retry_limit,
                base_delay: Duration::from_secs(config.datastore.retry_base_secs),
            });
        Ok(Self {
            client,
            cache,
            config,
            geometry: OnceCell::new(),
            cycle_lock: Mutex::new(()),
        })
    }

    /// Runs one full refresh cycle: fetch, aggregate all windows from
    /// the frozen snapshot, publish per window.
    ///
    /// # Errors
    ///
    /// Returns [`CycleError`] if geometry is unavailable or no source
    /// produced any records. Individual source failures are logged and
    /// tolerated as long as at least one source delivered.
    pub async fn run_cycle(&self) -> Result<(), CycleError> {
        let _guard = self.cycle_lock.lock().await;
        let started = Instant::now();
        log::info!("Starting refresh cycle");

        let (records, potholes, wards) = tokio::join!(
            fetch_all_grievances(&self.client, &self.config.sources.grievance_resources),
            fetch_pothole_counts(&self.client, &self.config.sources.pothole_resource),
            self.ward_geometry(),
        );
        let wards = wards?;

        if records.is_empty() {
            return Err(CycleError::NoRecords);
        }
        log::info!(
            "Fetch complete in {:.1}s — {} records",
            started.elapsed().as_secs_f64(),
            records.len()
        );

        let canonical_names: Vec<String> = wards.iter().map(|w| w.name.clone()).collect();
        let normalizer =
            WardNormalizer::new(&canonical_names, self.config.ward_name_overrides.clone());
        let streetlight = self.config.streetlight_set();

        let windows = aggregate_windows(
            &records,
            &normalizer,
            &potholes,
            wards,
            &streetlight,
            Utc::now(),
        );

        let unmapped = normalizer.unmapped();
        if !unmapped.is_empty() {
            log::info!("{} ward spellings stayed unmapped this cycle", unmapped.len());
        }

        let computed_at = Utc::now();
        for (window, stats) in windows {
            log::info!("Publishing {} wards for window {window}", stats.len());
            self.cache.replace(window, stats, computed_at);
        }

        log::info!(
            "Refresh cycle done in {:.1}s",
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Returns the canonical ward list, fetching it on first use.
    async fn ward_geometry(&self) -> Result<&Vec<CanonicalWard>, GeographyError> {
        self.geometry
            .get_or_try_init(|| fetch_ward_geometry(&self.config.sources.ward_geometry_url))
            .await
    }

    /// Spawns the refresh task: one cycle immediately, then one per
    /// configured interval. Cycle failures are logged and the loop
    /// keeps going.
    #[must_use]
    pub fn spawn_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let pipeline = Arc::clone(self);
        let every = Duration::from_secs(pipeline.config.refresh.interval_minutes * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = pipeline.run_cycle().await {
                    log::error!("Refresh cycle failed: {e}");
                }
            }
        })
    }
}
