//! Dataset expansion through album siblings.
//!
//! Charted songs are a small and biased slice of the catalog. The
//! [`AlbumSampler`] widens it by sampling other tracks from the albums the
//! resolved songs appear on.

use rand::Rng;
use serde::Serialize;

use chartwise_core::model::ResolvedMatch;
use chartwise_core::MatchStore;

use crate::catalog::Catalog;
use crate::error::PipelineResult;
use crate::matching::MatchEvaluator;
use crate::query::QueryClient;

/// Counters for one expansion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpansionReport {
    /// Songs without a known album.
    pub without_album: usize,
    pub albums_visited: usize,
    pub sampled: usize,
    pub blacklisted: usize,
    /// Samples dropped because they were the source song itself.
    pub self_excluded: usize,
    pub stored: usize,
}

/// Samples sibling tracks from the albums of resolved songs.
#[derive(Debug, Clone)]
pub struct AlbumSampler {
    sample_size: usize,
    evaluator: MatchEvaluator,
}

impl AlbumSampler {
    pub fn new(sample_size: usize, evaluator: MatchEvaluator) -> Self {
        Self {
            sample_size,
            evaluator,
        }
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Provenance tag stored as the search query of expanded entries.
    pub fn provenance(source_name: &str) -> String {
        format!("Shares album with {source_name}")
    }

    /// Visit the album of every song in `songs` and store up to
    /// `sample_size` of its other tracks in `store`, keyed by catalog id.
    pub async fn run<'a, C, R>(
        &self,
        client: &QueryClient<C>,
        songs: impl IntoIterator<Item = &'a ResolvedMatch>,
        store: &mut MatchStore,
        rng: &mut R,
    ) -> PipelineResult<ExpansionReport>
    where
        C: Catalog,
        R: Rng + ?Sized,
    {
        let mut report = ExpansionReport::default();

        for source in songs {
            let Some(album) = source.song.album.as_ref().filter(|album| !album.id.is_empty())
            else {
                report.without_album += 1;
                continue;
            };

            let tracks = match client.album_tracks(&album.id).await {
                Ok(tracks) => tracks,
                Err(err) => {
                    log::error!("Stopping expansion at album {}: {}", album.id, err);
                    store.flush()?;
                    return Err(err);
                }
            };
            report.albums_visited += 1;

            if tracks.len() < 2 {
                log::debug!("Album {} has no siblings to sample", album.name);
                continue;
            }

            let amount = self.sample_size.min(tracks.len());
            let query = Self::provenance(&source.song.name);

            for index in rand::seq::index::sample(rng, tracks.len(), amount) {
                report.sampled += 1;
                let track = &tracks[index];

                if track.id == source.song.id {
                    report.self_excluded += 1;
                    continue;
                }
                if self.evaluator.is_blacklisted(&track.name) {
                    log::debug!("Skipping blacklisted sibling {:?}", track.name);
                    report.blacklisted += 1;
                    continue;
                }

                let mut sibling = track.clone();
                sibling.album = Some(album.clone());
                if store.store_song(&query, sibling, None, None) {
                    report.stored += 1;
                }
            }
        }

        store.flush()?;

        log::info!(
            "Expansion complete: {} albums, {} sampled, {} stored",
            report.albums_visited,
            report.sampled,
            report.stored
        );

        Ok(report)
    }
}
