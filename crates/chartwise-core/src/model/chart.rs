use serde::{Deserialize, Serialize};

use crate::key::dedup_key;

/// One entry of a weekly chart, as produced by the chart dataset reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartRecord {
    pub rank: u32,
    pub song: String,
    pub artist: String,

    /// Position in the previous week's chart; absent for new entries.
    #[serde(default)]
    pub last_week: Option<u32>,

    pub peak_rank: u32,
    pub weeks_on_board: u32,

    /// Chart date as printed in the dataset (e.g. "2021-11-06").
    pub date: String,
}

impl ChartRecord {
    #[must_use]
    pub fn new(song: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            rank: 0,
            song: song.into(),
            artist: artist.into(),
            last_week: None,
            peak_rank: 0,
            weeks_on_board: 0,
            date: String::new(),
        }
    }

    #[must_use]
    pub fn with_rank(mut self, rank: u32, peak_rank: u32, weeks_on_board: u32) -> Self {
        self.rank = rank;
        self.peak_rank = peak_rank;
        self.weeks_on_board = weeks_on_board;
        self
    }

    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// The store key for this record's (song, artist) pair.
    #[must_use]
    pub fn key(&self) -> String {
        dedup_key(&self.song, &self.artist)
    }
}
