//! In-memory catalog shared by the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chartwise_core::model::{CatalogAlbum, CatalogArtist, CatalogSongInfo, FeatureVector};
use chartwise_etl::{Catalog, CatalogError, CatalogResult, TrackFeatures};

#[derive(Debug, Default)]
pub struct FakeCatalog {
    search_results: HashMap<String, Vec<CatalogSongInfo>>,
    features: HashMap<String, FeatureVector>,
    albums: HashMap<String, Vec<CatalogSongInfo>>,
    /// Fail this many calls with a timeout before answering.
    flaky_calls: AtomicUsize,
    pub searches: AtomicUsize,
    pub feature_calls: AtomicUsize,
    pub album_calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, query: &str, results: Vec<CatalogSongInfo>) -> Self {
        self.search_results.insert(query.to_string(), results);
        self
    }

    pub fn features(mut self, id: &str, danceability: f64) -> Self {
        self.features.insert(id.to_string(), feature_vector(danceability));
        self
    }

    pub fn album(mut self, album_id: &str, tracks: Vec<CatalogSongInfo>) -> Self {
        self.albums.insert(album_id.to_string(), tracks);
        self
    }

    pub fn flaky(self, calls: usize) -> Self {
        self.flaky_calls.store(calls, Ordering::SeqCst);
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn fail_if_flaky(&self) -> CatalogResult<()> {
        let left = self.flaky_calls.load(Ordering::SeqCst);
        if left > 0 {
            self.flaky_calls.store(left - 1, Ordering::SeqCst);
            return Err(CatalogError::Timeout {
                source_name: "Fake".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    fn name(&self) -> &str {
        "Fake"
    }

    async fn search(&self, query: &str, limit: u32) -> CatalogResult<Vec<CatalogSongInfo>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        self.fail_if_flaky()?;
        Ok(self
            .search_results
            .get(query)
            .map(|songs| songs.iter().take(limit as usize).cloned().collect())
            .unwrap_or_default())
    }

    async fn features(&self, ids: &[String]) -> CatalogResult<Vec<Option<TrackFeatures>>> {
        self.feature_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_if_flaky()?;
        Ok(ids
            .iter()
            .map(|id| {
                self.features.get(id).map(|features| TrackFeatures {
                    id: id.clone(),
                    features: features.clone(),
                })
            })
            .collect())
    }

    async fn album_tracks(&self, album_id: &str) -> CatalogResult<Vec<CatalogSongInfo>> {
        self.album_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_if_flaky()?;
        Ok(self.albums.get(album_id).cloned().unwrap_or_default())
    }
}

pub fn track(id: &str, name: &str, artists: &[&str]) -> CatalogSongInfo {
    artists
        .iter()
        .fold(CatalogSongInfo::new(id, name), |song, artist| {
            song.with_artist(CatalogArtist::new(*artist, format!("{artist}-id")))
        })
}

pub fn on_album(song: CatalogSongInfo, album_id: &str, name: &str) -> CatalogSongInfo {
    song.with_album(CatalogAlbum {
        name: name.to_string(),
        id: album_id.to_string(),
        total_tracks: 12,
        release_date: "2015".to_string(),
    })
}

pub fn feature_vector(danceability: f64) -> FeatureVector {
    FeatureVector {
        time_signature: 4,
        duration_ms: 210_000,
        key: 7,
        mode: 1,
        acousticness: 0.1,
        danceability,
        energy: 0.7,
        instrumentalness: 0.0,
        liveness: 0.12,
        loudness: -4.5,
        speechiness: 0.04,
        valence: 0.6,
        tempo: 118.0,
    }
}
