//! Remote music catalog access.
//!
//! The [`Catalog`] trait captures the three calls the pipeline makes:
//! free-text track search, batched audio-feature lookup, and album track
//! listing. [`SpotifyClient`] implements it against the Spotify Web API.

pub mod spotify;

use async_trait::async_trait;
use chartwise_core::model::{CatalogSongInfo, FeatureVector};

use crate::error::CatalogResult;

pub use spotify::SpotifyClient;

/// Audio features for one catalog track, as returned by a batched lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackFeatures {
    /// Catalog id the features belong to.
    pub id: String,
    pub features: FeatureVector,
}

/// A remote music catalog.
///
/// Implementations perform exactly one remote call per method invocation;
/// retrying is the caller's concern.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Human-readable source name used in logs and errors.
    fn name(&self) -> &str;

    /// Search tracks by free text, returning at most `limit` results in the
    /// catalog's relevance order.
    async fn search(&self, query: &str, limit: u32) -> CatalogResult<Vec<CatalogSongInfo>>;

    /// Look up audio features for up to [`MAX_FEATURE_BATCH`] ids.
    ///
    /// The result nominally has one slot per requested id, in request
    /// order; `None` marks an id without analysis.
    async fn features(&self, ids: &[String]) -> CatalogResult<Vec<Option<TrackFeatures>>>;

    /// List every track on an album. Returned tracks carry no album.
    async fn album_tracks(&self, album_id: &str) -> CatalogResult<Vec<CatalogSongInfo>>;
}

/// Largest number of ids a single feature lookup accepts.
pub const MAX_FEATURE_BATCH: usize = 50;

#[cfg(test)]
pub(crate) mod mock;
