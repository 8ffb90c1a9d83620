//! Bounded-retry access to a [`Catalog`].
//!
//! Every remote call made by the pipeline goes through a [`QueryClient`],
//! which retries transient failures according to its [`RetryPolicy`]. When
//! the attempt budget runs out the client reports
//! [`PipelineError::Unavailable`]; an empty result list is a successful
//! call that simply found nothing.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};

use backon::Retryable;
use chartwise_core::model::CatalogSongInfo;

use crate::catalog::{Catalog, TrackFeatures};
use crate::error::{CatalogError, CatalogResult, PipelineError, PipelineResult};
use crate::resilience::RetryPolicy;

/// A catalog wrapped in a retry policy.
#[derive(Debug)]
pub struct QueryClient<C> {
    catalog: C,
    policy: RetryPolicy,
}

impl<C: Catalog> QueryClient<C> {
    pub fn new(catalog: C, policy: RetryPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Search the catalog for `query`, returning at most `limit` tracks in
    /// the catalog's relevance order.
    pub async fn search(&self, query: &str, limit: u32) -> PipelineResult<Vec<CatalogSongInfo>> {
        self.with_retry(format!("search {query:?}"), || {
            self.catalog.search(query, limit)
        })
        .await
    }

    /// Fetch audio features for a batch of catalog ids.
    pub async fn features(&self, ids: &[String]) -> PipelineResult<Vec<Option<TrackFeatures>>> {
        self.with_retry(format!("features for {} ids", ids.len()), || {
            self.catalog.features(ids)
        })
        .await
    }

    /// List the tracks on an album.
    pub async fn album_tracks(&self, album_id: &str) -> PipelineResult<Vec<CatalogSongInfo>> {
        self.with_retry(format!("album {album_id}"), || {
            self.catalog.album_tracks(album_id)
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, operation: String, mut call: F) -> PipelineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = CatalogResult<T>>,
    {
        let attempts = AtomicU32::new(0);

        let result = (|| {
            attempts.fetch_add(1, Ordering::Relaxed);
            call()
        })
        .retry(self.policy.backoff())
        .when(CatalogError::is_transient)
        .notify(|err, delay| {
            log::warn!(
                "{} on {} failed ({}), retrying in {:?}",
                operation,
                self.catalog.name(),
                err,
                delay
            );
        })
        .await;

        match result {
            Ok(value) => Ok(value),
            Err(source) if source.is_transient() => {
                let attempts = attempts.load(Ordering::Relaxed);
                log::error!("{} gave up after {} attempts: {}", operation, attempts, source);
                Err(PipelineError::Unavailable {
                    operation,
                    attempts,
                    source,
                })
            }
            Err(source) => Err(PipelineError::Catalog(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::mock::{song, ScriptedCatalog};
    use std::time::Duration;

    #[tokio::test]
    async fn test_search_returns_results_in_catalog_order() {
        let catalog = ScriptedCatalog::new().with_search(
            "Hello",
            vec![
                song("a", "Hello", "Lionel Richie"),
                song("b", "Hello", "Adele"),
            ],
        );
        let client = QueryClient::new(catalog, RetryPolicy::immediate(3));

        let results = client.search("Hello", 3).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let client = QueryClient::new(ScriptedCatalog::new(), RetryPolicy::immediate(3));
        let results = client.search("Nothing Here", 3).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(client.catalog().search_count(), 1);
    }

    #[tokio::test]
    async fn test_timeouts_are_retried_until_success() {
        let catalog = ScriptedCatalog::new()
            .with_search("Hello", vec![song("b", "Hello", "Adele")])
            .timing_out(3);
        let client = QueryClient::new(catalog, RetryPolicy::immediate(10));

        let results = client.search("Hello", 3).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(client.catalog().search_count(), 4);
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_unavailable() {
        let client =
            QueryClient::new(ScriptedCatalog::new().unreachable(), RetryPolicy::immediate(10));

        let err = client.search("Hello", 3).await.unwrap_err();

        assert!(err.is_unavailable());
        match err {
            PipelineError::Unavailable { attempts, .. } => assert_eq!(attempts, 10),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.catalog().search_count(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_wait_for_the_policy_delays() {
        let policy = RetryPolicy {
            max_attempts: 4,
            min_delay_ms: 100,
            max_delay_ms: 400,
            factor: 2.0,
            jitter: false,
        };
        let catalog = ScriptedCatalog::new()
            .with_search("Hello", vec![song("b", "Hello", "Adele")])
            .timing_out(3);
        let client = QueryClient::new(catalog, policy);
        let start = tokio::time::Instant::now();

        client.search("Hello", 3).await.unwrap();

        // 100 + 200 + 400 ms of backoff
        assert!(start.elapsed() >= Duration::from_millis(690));
    }

    #[tokio::test]
    async fn test_album_tracks_retry_shares_policy() {
        let catalog = ScriptedCatalog::new()
            .with_album("al1", vec![song("t1", "One", "A"), song("t2", "Two", "A")])
            .timing_out(1);
        let client = QueryClient::new(catalog, RetryPolicy::immediate(2));

        let tracks = client.album_tracks("al1").await.unwrap();
        assert_eq!(tracks.len(), 2);
    }
}
