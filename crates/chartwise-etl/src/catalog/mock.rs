//! Scripted in-memory catalog for unit tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chartwise_core::model::{CatalogArtist, CatalogSongInfo, FeatureVector};

use crate::catalog::{Catalog, TrackFeatures};
use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Default)]
pub struct ScriptedCatalog {
    search_results: HashMap<String, Vec<CatalogSongInfo>>,
    features: HashMap<String, FeatureVector>,
    feature_aliases: HashMap<String, String>,
    albums: HashMap<String, Vec<CatalogSongInfo>>,
    timeouts_left: AtomicU32,
    always_time_out: bool,
    healthy_calls: Option<u32>,
    calls: AtomicU32,
    watched_snapshot: Option<PathBuf>,
    pub snapshot_sizes: Mutex<Vec<Option<usize>>>,
    reverse_features: bool,
    pub searches: Mutex<Vec<String>>,
    pub feature_batches: Mutex<Vec<Vec<String>>>,
    pub album_requests: Mutex<Vec<String>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, query: &str, results: Vec<CatalogSongInfo>) -> Self {
        self.search_results.insert(query.to_string(), results);
        self
    }

    pub fn with_features(mut self, id: &str, features: FeatureVector) -> Self {
        self.features.insert(id.to_string(), features);
        self
    }

    /// Answer a feature lookup for `requested` with a record labelled
    /// `returned`.
    pub fn with_feature_alias(mut self, requested: &str, returned: &str) -> Self {
        self.feature_aliases
            .insert(requested.to_string(), returned.to_string());
        self
    }

    pub fn with_album(mut self, album_id: &str, tracks: Vec<CatalogSongInfo>) -> Self {
        self.albums.insert(album_id.to_string(), tracks);
        self
    }

    /// Time out on the first `n` calls, then behave normally.
    pub fn timing_out(self, n: u32) -> Self {
        self.timeouts_left.store(n, Ordering::SeqCst);
        self
    }

    /// Time out on every call.
    pub fn unreachable(mut self) -> Self {
        self.always_time_out = true;
        self
    }

    /// Answer the first `n` calls, then time out on every later one.
    pub fn failing_after(mut self, n: u32) -> Self {
        self.healthy_calls = Some(n);
        self
    }

    /// On every search, record how many entries the snapshot at `path`
    /// holds on disk (`None` while the file does not exist).
    pub fn watching_snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.watched_snapshot = Some(path.into());
        self
    }

    /// Return feature slots in reverse request order.
    pub fn reversing_features(mut self) -> Self {
        self.reverse_features = true;
        self
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().unwrap().len()
    }

    fn maybe_time_out(&self) -> CatalogResult<()> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.always_time_out || self.healthy_calls.is_some_and(|healthy| call >= healthy) {
            return Err(timeout());
        }
        let left = self.timeouts_left.load(Ordering::SeqCst);
        if left > 0 {
            self.timeouts_left.store(left - 1, Ordering::SeqCst);
            return Err(timeout());
        }
        Ok(())
    }
}

fn timeout() -> CatalogError {
    CatalogError::Timeout {
        source_name: "Scripted".to_string(),
    }
}

#[async_trait]
impl Catalog for ScriptedCatalog {
    fn name(&self) -> &str {
        "Scripted"
    }

    async fn search(&self, query: &str, limit: u32) -> CatalogResult<Vec<CatalogSongInfo>> {
        self.searches.lock().unwrap().push(query.to_string());
        if let Some(path) = &self.watched_snapshot {
            let on_disk = std::fs::read_to_string(path).ok().map(|json| {
                serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&json)
                    .unwrap()
                    .len()
            });
            self.snapshot_sizes.lock().unwrap().push(on_disk);
        }
        self.maybe_time_out()?;
        Ok(self
            .search_results
            .get(query)
            .map(|results| results.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn features(&self, ids: &[String]) -> CatalogResult<Vec<Option<TrackFeatures>>> {
        self.feature_batches.lock().unwrap().push(ids.to_vec());
        self.maybe_time_out()?;
        let mut slots: Vec<Option<TrackFeatures>> = ids
            .iter()
            .map(|id| {
                self.features.get(id).map(|features| TrackFeatures {
                    id: self.feature_aliases.get(id).unwrap_or(id).clone(),
                    features: features.clone(),
                })
            })
            .collect();
        if self.reverse_features {
            slots.reverse();
        }
        Ok(slots)
    }

    async fn album_tracks(&self, album_id: &str) -> CatalogResult<Vec<CatalogSongInfo>> {
        self.album_requests.lock().unwrap().push(album_id.to_string());
        self.maybe_time_out()?;
        Ok(self.albums.get(album_id).cloned().unwrap_or_default())
    }
}

/// A catalog track credited to a single artist.
pub fn song(id: &str, name: &str, artist: &str) -> CatalogSongInfo {
    CatalogSongInfo::new(id, name).with_artist(CatalogArtist::new(artist, format!("{artist}-id")))
}

/// Arbitrary but valid audio features; `seed` distinguishes tracks.
pub fn features(seed: f64) -> FeatureVector {
    FeatureVector {
        time_signature: 4,
        duration_ms: 200_000,
        key: 1,
        mode: 1,
        acousticness: seed,
        danceability: 0.5,
        energy: 0.5,
        instrumentalness: 0.0,
        liveness: 0.1,
        loudness: -5.0,
        speechiness: 0.05,
        valence: 0.5,
        tempo: 120.0,
    }
}
