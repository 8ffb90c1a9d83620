//! Candidate acceptance rules.
//!
//! A [`MatchEvaluator`] decides whether a catalog search result is the song
//! a chart entry refers to. Searches regularly surface live cuts, remixes
//! and karaoke re-recordings under the same title, so candidates whose name
//! carries a blacklisted word are rejected unless a whitelisted phrase
//! vouches for them (some official releases are named "... (Taylor's
//! Version)").

use serde::{Deserialize, Serialize};

use chartwise_core::model::CatalogSongInfo;

use crate::similarity::token_set_ratio;

/// Threshold that selects exact-title matching.
pub const EXACT_RATIO: u8 = 100;

/// Blacklist, whitelist and exact-mode artist threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    /// Candidate names containing any of these (case-insensitive) are rejected.
    pub blacklist: Vec<String>,
    /// Phrases that lift the blacklist for a candidate name.
    pub whitelist: Vec<String>,
    /// Artist similarity required when titles must match exactly.
    pub exact_artist_ratio: u8,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            blacklist: ["Version", "Instrumental", "Emulation", "Remix"]
                .into_iter()
                .map(String::from)
                .collect(),
            whitelist: [
                "Taylor's Version",
                "No New Friends",
                "Karate Chop",
                "Get Sleazier",
                "Don't cry me Argentina",
                "Outta Control",
                "A Country Boy Can Survive",
                "Turn It Up /",
                "Love Theme From St.Elmo's Fire",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            exact_artist_ratio: 95,
        }
    }
}

/// Outcome of evaluating one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchVerdict {
    Accepted,
    /// The candidate's name is blacklisted.
    Blacklisted,
    /// The title differs (exact mode) or scored below the threshold.
    NameMismatch { score: Option<u8> },
    /// The credited artists scored below the required similarity.
    ArtistMismatch { score: u8 },
}

impl MatchVerdict {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// Applies [`MatchRules`] to candidates.
#[derive(Debug, Clone)]
pub struct MatchEvaluator {
    blacklist: Vec<String>,
    whitelist: Vec<String>,
    exact_artist_ratio: u8,
}

impl Default for MatchEvaluator {
    fn default() -> Self {
        Self::new(&MatchRules::default())
    }
}

impl MatchEvaluator {
    pub fn new(rules: &MatchRules) -> Self {
        Self {
            blacklist: rules.blacklist.iter().map(|s| s.to_lowercase()).collect(),
            whitelist: rules.whitelist.iter().map(|s| s.to_lowercase()).collect(),
            exact_artist_ratio: rules.exact_artist_ratio,
        }
    }

    /// Whether a catalog track name is excluded by the blacklist.
    pub fn is_blacklisted(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.blacklist.iter().any(|word| name.contains(word.as_str()))
            && !self.whitelist.iter().any(|phrase| name.contains(phrase.as_str()))
    }

    /// Judge `candidate` against the chart pair (`song`, `artist`).
    ///
    /// At [`EXACT_RATIO`] the titles must be equal ignoring case and the
    /// artists must reach the exact-mode artist ratio. Below it, both the
    /// title and the artists must reach `allowed_ratio` token-set
    /// similarity. Candidate artists are compared as one space-joined
    /// string.
    pub fn evaluate(
        &self,
        song: &str,
        artist: &str,
        candidate: &CatalogSongInfo,
        allowed_ratio: u8,
    ) -> MatchVerdict {
        if self.is_blacklisted(&candidate.name) {
            return MatchVerdict::Blacklisted;
        }

        let candidate_artists = candidate.joined_artist_names();

        let required_artist_ratio = if allowed_ratio >= EXACT_RATIO {
            if song.to_lowercase() != candidate.name.to_lowercase() {
                return MatchVerdict::NameMismatch { score: None };
            }
            self.exact_artist_ratio
        } else {
            let score = token_set_ratio(song, &candidate.name);
            if score < allowed_ratio {
                return MatchVerdict::NameMismatch { score: Some(score) };
            }
            allowed_ratio
        };

        let artist_score = token_set_ratio(artist, &candidate_artists);
        if artist_score < required_artist_ratio {
            return MatchVerdict::ArtistMismatch {
                score: artist_score,
            };
        }

        MatchVerdict::Accepted
    }

    /// Shorthand for `evaluate(..).is_accepted()`.
    pub fn is_match(
        &self,
        song: &str,
        artist: &str,
        candidate: &CatalogSongInfo,
        allowed_ratio: u8,
    ) -> bool {
        self.evaluate(song, artist, candidate, allowed_ratio)
            .is_accepted()
    }
}
