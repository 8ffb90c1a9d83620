use serde::{Deserialize, Serialize};

use crate::model::ResolvedMatch;

/// Audio attributes the catalog computes for a track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureVector {
    pub time_signature: i32,
    #[serde(rename = "durationMS")]
    pub duration_ms: u64,
    /// Pitch class (0 = C), or -1 when no key was detected.
    pub key: i32,
    /// 1 = major, 0 = minor.
    pub mode: i32,
    pub acousticness: f64,
    pub danceability: f64,
    pub energy: f64,
    pub instrumentalness: f64,
    pub liveness: f64,
    /// Overall loudness in dB.
    pub loudness: f64,
    pub speechiness: f64,
    pub valence: f64,
    /// Estimated tempo in BPM.
    pub tempo: f64,
}

/// A resolved song together with its audio attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongFeatures {
    pub info: ResolvedMatch,

    /// `None` when the catalog has no analysis for the track.
    #[serde(default)]
    pub features: Option<FeatureVector>,
}

impl SongFeatures {
    #[must_use]
    pub fn new(info: ResolvedMatch, features: Option<FeatureVector>) -> Self {
        Self { info, features }
    }

    #[must_use]
    pub fn has_features(&self) -> bool {
        self.features.is_some()
    }
}
