//! Two-pass resolution of chart records against the catalog.
//!
//! Pass 1 searches for the song title alone and only accepts an exact title
//! match. Records it leaves unmatched get a second, permissive pass that
//! searches for "title artist" and accepts fuzzy matches. Records already in
//! the match store are never queried again, so a run can be resumed or
//! repeated over a growing chart dataset.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use chartwise_core::model::ChartRecord;
use chartwise_core::MatchStore;

use crate::catalog::Catalog;
use crate::error::{PipelineError, PipelineResult};
use crate::matching::{MatchEvaluator, MatchVerdict, EXACT_RATIO};
use crate::query::QueryClient;

const PROGRESS_EVERY: usize = 1000;

/// What the engine does when the catalog stays unavailable for a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Flush the store and stop the run with the error.
    #[default]
    Abort,
    /// Count the record as failed and move on to the next one.
    SkipRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveSettings {
    /// Candidates requested per search.
    pub search_limit: u32,
    /// Threshold used by the strict pass.
    pub exact_ratio: u8,
    /// Threshold used by the permissive pass.
    pub fuzzy_ratio: u8,
    /// Flush the store after this many processed records; 0 disables
    /// periodic flushing.
    pub flush_every: usize,
    pub exhaustion: ExhaustionPolicy,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            search_limit: 3,
            exact_ratio: EXACT_RATIO,
            fuzzy_ratio: 90,
            flush_every: 5000,
            exhaustion: ExhaustionPolicy::Abort,
        }
    }
}

/// Counters for one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub input: usize,
    pub unique: usize,
    pub duplicates: usize,
    pub already_stored: usize,
    pub exact_matches: usize,
    pub fuzzy_matches: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub queries: usize,
}

impl ResolutionReport {
    pub fn matched(&self) -> usize {
        self.exact_matches + self.fuzzy_matches
    }
}

/// Drives both resolution passes over a batch of chart records.
#[derive(Debug, Clone, Default)]
pub struct ResolutionEngine {
    evaluator: MatchEvaluator,
    settings: ResolveSettings,
}

impl ResolutionEngine {
    pub fn new(evaluator: MatchEvaluator, settings: ResolveSettings) -> Self {
        Self {
            evaluator,
            settings,
        }
    }

    pub fn settings(&self) -> &ResolveSettings {
        &self.settings
    }

    /// Resolve `records`, writing accepted matches into `store`.
    ///
    /// The store is flushed periodically and once more at the end. When
    /// the run stops on an error the store is flushed first, so everything
    /// matched so far survives.
    pub async fn run<C: Catalog>(
        &self,
        client: &QueryClient<C>,
        records: &[ChartRecord],
        store: &mut MatchStore,
    ) -> PipelineResult<ResolutionReport> {
        let mut report = ResolutionReport {
            input: records.len(),
            ..ResolutionReport::default()
        };

        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for record in records {
            let key = record.key();
            if store.contains_key(&key) {
                report.already_stored += 1;
            } else if seen.insert(key) {
                unique.push(record);
            } else {
                report.duplicates += 1;
            }
        }
        report.unique = unique.len();

        log::info!(
            "Resolving {} chart records ({} unique, {} already stored, {} duplicates)",
            report.input,
            report.unique,
            report.already_stored,
            report.duplicates
        );

        let mut processed = 0;

        let mut unmatched = Vec::new();
        for record in unique {
            let exact_ratio = self.settings.exact_ratio;
            let outcome = self
                .try_record(client, record, &record.song, exact_ratio, store, &mut report)
                .await;
            match outcome {
                Ok(true) => report.exact_matches += 1,
                Ok(false) => unmatched.push(record),
                Err(err) => self.on_failure(err, record, store, &mut report)?,
            }
            processed += 1;
            self.checkpoint(processed, store)?;
        }

        log::info!(
            "Strict pass matched {} records, {} left for the permissive pass",
            report.exact_matches,
            unmatched.len()
        );

        for record in unmatched {
            let query = format!("{} {}", record.song, record.artist);
            let outcome = self
                .try_record(client, record, &query, self.settings.fuzzy_ratio, store, &mut report)
                .await;
            match outcome {
                Ok(true) => report.fuzzy_matches += 1,
                Ok(false) => {
                    log::debug!("No match for {:?} by {:?}", record.song, record.artist);
                    report.unmatched += 1;
                }
                Err(err) => self.on_failure(err, record, store, &mut report)?,
            }
            processed += 1;
            self.checkpoint(processed, store)?;
        }

        store.flush()?;

        log::info!(
            "Resolution complete: {} exact, {} fuzzy, {} unmatched, {} failed, {} queries",
            report.exact_matches,
            report.fuzzy_matches,
            report.unmatched,
            report.failed,
            report.queries
        );

        Ok(report)
    }

    /// Search once and store the first acceptable candidate.
    async fn try_record<C: Catalog>(
        &self,
        client: &QueryClient<C>,
        record: &ChartRecord,
        query: &str,
        ratio: u8,
        store: &mut MatchStore,
        report: &mut ResolutionReport,
    ) -> PipelineResult<bool> {
        report.queries += 1;
        let candidates = client.search(query, self.settings.search_limit).await?;

        for candidate in candidates {
            match self
                .evaluator
                .evaluate(&record.song, &record.artist, &candidate, ratio)
            {
                MatchVerdict::Accepted => {
                    log::debug!(
                        "Matched {:?} by {:?} to {} at {}",
                        record.song,
                        record.artist,
                        candidate.id,
                        ratio
                    );
                    store.store_song(query, candidate, Some(ratio), Some(record.clone()));
                    return Ok(true);
                }
                verdict => log::trace!(
                    "Rejected {:?} ({}) for {:?}: {:?}",
                    candidate.name,
                    candidate.id,
                    record.song,
                    verdict
                ),
            }
        }

        Ok(false)
    }

    fn on_failure(
        &self,
        err: PipelineError,
        record: &ChartRecord,
        store: &MatchStore,
        report: &mut ResolutionReport,
    ) -> PipelineResult<()> {
        if err.is_unavailable() && self.settings.exhaustion == ExhaustionPolicy::SkipRecord {
            log::warn!(
                "Skipping {:?} by {:?}: {}",
                record.song,
                record.artist,
                err
            );
            report.failed += 1;
            return Ok(());
        }

        log::error!(
            "Stopping at {:?} by {:?}: {}",
            record.song,
            record.artist,
            err
        );
        store.flush()?;
        Err(err)
    }

    fn checkpoint(&self, processed: usize, store: &MatchStore) -> PipelineResult<()> {
        if processed % PROGRESS_EVERY == 0 {
            log::info!("Processed {} records, {} stored", processed, store.len());
        }
        if self.settings.flush_every > 0 && processed % self.settings.flush_every == 0 {
            log::debug!("Flushing {} entries to {}", store.len(), store.path().display());
            store.flush()?;
        }
        Ok(())
    }
}
