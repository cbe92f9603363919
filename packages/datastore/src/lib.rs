#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Rate-limited paginated client for the CKAN datastore search API.
//!
//! The datastore exposes an offset/limit pagination contract and returns
//! HTTP 429 under load. This client first issues a zero-row probe to learn
//! the total record count, then fetches every page concurrently through a
//! shared semaphore so the outbound fan-out stays bounded no matter how
//! large the resource is or how many resources are fetched together.
//!
//! Records come back as raw [`serde_json::Value`] objects; parsing into
//! typed rows is the caller's concern.

pub mod retry;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Semaphore;

pub use retry::RetryPolicy;

/// Default records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default maximum number of in-flight requests.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// HTTP timeout for a single datastore request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur while talking to the datastore.
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    /// An HTTP request failed (transport error or non-2xx status).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 2xx but reported a failure envelope.
    #[error("Datastore API error: {0}")]
    Api(String),

    /// The request was rate limited and the retry budget is exhausted.
    #[error("Rate limited after {attempts} attempts")]
    RateLimited {
        /// Number of attempts made, including the first.
        attempts: u32,
    },
}

/// One `datastore_search` result page.
#[derive(Debug, Deserialize)]
pub(crate) struct SearchResult {
    /// Total records in the resource, regardless of page size.
    pub total: u64,
    /// Records in this page.
    pub records: Vec<serde_json::Value>,
}

/// CKAN response envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    result: Option<SearchResult>,
}

/// Client for a CKAN-style datastore endpoint.
///
/// All requests issued through one client share a single semaphore, so
/// fetching multiple resources concurrently still respects the global
/// concurrency ceiling. Every page request is idempotent and safely
/// retriable on its own.
#[derive(Debug)]
pub struct DatastoreClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
    semaphore: Arc<Semaphore>,
    retry: RetryPolicy,
}

impl DatastoreClient {
    /// Creates a client for the given API base URL (the segment before
    /// `/datastore_search`) with default page size, concurrency, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError::Http`] if the underlying HTTP client
    /// fails to initialize.
    pub fn new(base_url: &str) -> Result<Self, DatastoreError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
            retry: RetryPolicy::default(),
        })
    }

    /// Sets the page size used for pagination.
    #[must_use]
    pub const fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size;
        self
    }

    /// Sets the maximum number of concurrent in-flight requests.
    #[must_use]
    pub fn with_max_concurrency(mut self, permits: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(permits));
        self
    }

    /// Sets the retry policy for rate-limited requests.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fetches every record of a resource, requesting only the given
    /// fields to keep payloads small.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] if the probe or any page fails after
    /// retries. Per-page failures are not partial: the whole fetch fails.
    pub async fn fetch_all(
        &self,
        resource_id: &str,
        fields: &[&str],
    ) -> Result<Vec<serde_json::Value>, DatastoreError> {
        let field_param = fields.join(",");

        // Zero-row probe to learn the total before paginating.
        let probe = self
            .search(resource_id, Some(field_param.as_str()), 0, None)
            .await?;
        let total = probe.total;
        log::info!("Resource {resource_id}: {total} total records");

        if total == 0 {
            return Ok(Vec::new());
        }

        let field_param = field_param.as_str();
        let pages = futures::future::try_join_all(
            page_offsets(total, self.page_size).into_iter().map(|offset| async move {
                self.search(
                    resource_id,
                    Some(field_param),
                    u64::from(self.page_size),
                    Some(offset),
                )
                .await
            }),
        )
        .await?;

        let records: Vec<serde_json::Value> =
            pages.into_iter().flat_map(|page| page.records).collect();
        log::info!("Fetched {} records from {resource_id}", records.len());
        Ok(records)
    }

    /// Fetches a single page of up to `limit` records. Suited to small
    /// resources that fit in one request.
    ///
    /// # Errors
    ///
    /// Returns [`DatastoreError`] if the request fails after retries.
    pub async fn fetch_single_page(
        &self,
        resource_id: &str,
        limit: u64,
    ) -> Result<Vec<serde_json::Value>, DatastoreError> {
        let result = self.search(resource_id, None, limit, None).await?;
        Ok(result.records)
    }

    /// Issues one `datastore_search` request with retry-on-throttle.
    async fn search(
        &self,
        resource_id: &str,
        fields: Option<&str>,
        limit: u64,
        offset: Option<u64>,
    ) -> Result<SearchResult, DatastoreError> {
        retry::with_retry(&self.retry, |attempt| {
            self.search_once(resource_id, fields, limit, offset, attempt)
        })
        .await
    }

    /// One request, no retry. Holds a semaphore permit only for the
    /// duration of the request, so backoff sleeps never block other pages.
    async fn search_once(
        &self,
        resource_id: &str,
        fields: Option<&str>,
        limit: u64,
        offset: Option<u64>,
        attempt: u32,
    ) -> Result<SearchResult, DatastoreError> {
        let _permit = self.semaphore.acquire().await.expect("semaphore closed");

        let url = format!("{}/datastore_search", self.base_url);
        let limit_param = limit.to_string();
        let mut request = self.http.get(&url).query(&[
            ("resource_id", resource_id),
            ("limit", limit_param.as_str()),
        ]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset.to_string())]);
        }
        if let Some(fields) = fields {
            request = request.query(&[("fields", fields)]);
        }

        log::debug!("GET {url} resource={resource_id} limit={limit} offset={offset:?}");

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DatastoreError::RateLimited {
                attempts: attempt + 1,
            });
        }

        let envelope: Envelope = response.error_for_status()?.json().await?;
        if !envelope.success {
            return Err(DatastoreError::Api(
                "datastore returned success=false".to_owned(),
            ));
        }
        envelope
            .result
            .ok_or_else(|| DatastoreError::Api("missing result in response".to_owned()))
    }
}

/// Page offsets needed to cover `total` records at the given page size.
fn page_offsets(total: u64, page_size: u32) -> Vec<u64> {
    (0..total).step_by(page_size as usize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_cover_exact_multiple() {
        assert_eq!(page_offsets(2000, 1000), vec![0, 1000]);
    }

    #[test]
    fn offsets_cover_partial_last_page() {
        assert_eq!(page_offsets(2500, 1000), vec![0, 1000, 2000]);
    }

    #[test]
    fn offsets_for_single_page() {
        assert_eq!(page_offsets(999, 1000), vec![0]);
    }

    #[test]
    fn no_offsets_for_empty_resource() {
        assert!(page_offsets(0, 1000).is_empty());
    }

    #[test]
    fn envelope_without_result_is_api_error() {
        let envelope: Envelope = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!envelope.success);
        assert!(envelope.result.is_none());
    }

    #[test]
    fn envelope_parses_search_result() {
        let envelope: Envelope = serde_json::from_str(
            r#"{"success": true, "result": {"total": 2, "records": [{"a": 1}, {"a": 2}]}}"#,
        )
        .unwrap();
        let result = envelope.result.unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.records.len(), 2);
    }
}
