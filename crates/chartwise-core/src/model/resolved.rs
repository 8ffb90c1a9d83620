use serde::{Deserialize, Serialize};

use crate::model::{CatalogSongInfo, ChartRecord};

/// A catalog track accepted as the canonical form of a chart entry, or
/// sampled from the album of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMatch {
    pub song: CatalogSongInfo,

    /// The search query that found the track. Album-expanded entries carry
    /// a provenance note here instead.
    pub search_query: String,

    /// Similarity threshold the match was accepted at.
    #[serde(default)]
    pub min_ratio: Option<u8>,

    /// The chart entry this track resolves; absent for album-expanded entries.
    #[serde(default)]
    pub chart: Option<ChartRecord>,
}

impl ResolvedMatch {
    #[must_use]
    pub fn new(song: CatalogSongInfo, search_query: impl Into<String>) -> Self {
        Self {
            song,
            search_query: search_query.into(),
            min_ratio: None,
            chart: None,
        }
    }

    #[must_use]
    pub fn with_min_ratio(mut self, ratio: u8) -> Self {
        self.min_ratio = Some(ratio);
        self
    }

    #[must_use]
    pub fn with_chart(mut self, chart: ChartRecord) -> Self {
        self.chart = Some(chart);
        self
    }

    /// Store key: the chart entry's dedup key, or the catalog id when there
    /// is no chart entry.
    #[must_use]
    pub fn key(&self) -> String {
        self.chart
            .as_ref()
            .map_or_else(|| self.song.id.clone(), ChartRecord::key)
    }
}
