//! Batched audio-feature lookup for resolved songs.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use chartwise_core::model::{FeatureVector, ResolvedMatch, SongFeatures};
use chartwise_core::FeatureStore;

use crate::catalog::{Catalog, MAX_FEATURE_BATCH};
use crate::error::PipelineResult;
use crate::query::QueryClient;

/// Counters for one feature run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureReport {
    /// Songs handed to the fetcher.
    pub requested: usize,
    /// Songs skipped because their id was already stored or repeated.
    pub skipped: usize,
    pub batches: usize,
    /// Records written to the feature store.
    pub stored: usize,
    /// Records stored without features.
    pub empty: usize,
    /// Returned records found at a different position than requested.
    pub realigned: usize,
    /// Returned records whose id matched no requested song.
    pub unknown: usize,
}

/// Fetches features for resolved songs in fixed-size batches.
#[derive(Debug, Clone)]
pub struct FeatureBatchFetcher {
    batch_size: usize,
}

impl Default for FeatureBatchFetcher {
    fn default() -> Self {
        Self::new(MAX_FEATURE_BATCH)
    }
}

impl FeatureBatchFetcher {
    /// A fetcher requesting `batch_size` ids per call, clamped to
    /// `1..=MAX_FEATURE_BATCH`.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.clamp(1, MAX_FEATURE_BATCH),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Fetch and store features for every song in `songs` whose catalog id
    /// is not in `store` yet, then flush the store.
    ///
    /// When a batch fails the store is flushed before the error is
    /// returned, so earlier batches are kept.
    pub async fn run<'a, C: Catalog>(
        &self,
        client: &QueryClient<C>,
        songs: impl IntoIterator<Item = &'a ResolvedMatch>,
        store: &mut FeatureStore,
    ) -> PipelineResult<FeatureReport> {
        let mut report = FeatureReport::default();
        let mut seen = HashSet::new();
        let mut todo = Vec::new();

        for song in songs {
            report.requested += 1;
            if store.contains_key(&song.song.id) || !seen.insert(song.song.id.as_str()) {
                report.skipped += 1;
            } else {
                todo.push(song);
            }
        }

        log::info!(
            "Fetching features for {} songs ({} skipped) in batches of {}",
            todo.len(),
            report.skipped,
            self.batch_size
        );

        for batch in todo.chunks(self.batch_size) {
            if let Err(err) = self.fetch_batch(client, batch, store, &mut report).await {
                log::error!(
                    "Stopping feature fetch after {} batches: {}",
                    report.batches,
                    err
                );
                store.flush()?;
                return Err(err);
            }
            report.batches += 1;
        }

        store.flush()?;

        log::info!(
            "Features complete: {} stored ({} without features), {} realigned, {} unknown",
            report.stored,
            report.empty,
            report.realigned,
            report.unknown
        );

        Ok(report)
    }

    async fn fetch_batch<C: Catalog>(
        &self,
        client: &QueryClient<C>,
        batch: &[&ResolvedMatch],
        store: &mut FeatureStore,
        report: &mut FeatureReport,
    ) -> PipelineResult<()> {
        let ids: Vec<String> = batch.iter().map(|song| song.song.id.clone()).collect();
        let slots = client.features(&ids).await?;

        // Position in `batch` -> features returned for that song.
        let mut found: HashMap<usize, FeatureVector> = HashMap::new();

        for (position, slot) in slots.into_iter().enumerate() {
            let Some(returned) = slot else {
                continue;
            };

            let owner = if ids.get(position) == Some(&returned.id) {
                Some(position)
            } else {
                let owner = ids.iter().position(|id| *id == returned.id);
                if let Some(expected) = owner {
                    log::warn!(
                        "Feature record for {} arrived at position {} instead of {}",
                        returned.id,
                        position,
                        expected
                    );
                    report.realigned += 1;
                }
                owner
            };

            match owner {
                Some(index) => {
                    found.entry(index).or_insert(returned.features);
                }
                None => {
                    log::warn!("Dropping feature record for unrequested id {}", returned.id);
                    report.unknown += 1;
                }
            }
        }

        for (index, song) in batch.iter().enumerate() {
            let features = found.remove(&index);
            if features.is_none() {
                log::debug!("No features for {} ({})", song.song.name, song.song.id);
                report.empty += 1;
            }
            let record = SongFeatures::new((*song).clone(), features);
            if store.store_features(song.song.id.clone(), record) {
                report.stored += 1;
            }
        }

        Ok(())
    }
}
