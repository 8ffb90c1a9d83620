use serde::{Deserialize, Serialize};

/// An artist credit on a catalog track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogArtist {
    pub name: String,
    pub id: String,
}

impl CatalogArtist {
    #[must_use]
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// The album (collection) a catalog track was released on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogAlbum {
    pub name: String,
    pub id: String,
    pub total_tracks: u32,

    /// Release date with the catalog's precision ("1989", "1989-10", "1989-10-27").
    pub release_date: String,
}

/// A canonical track in the remote catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSongInfo {
    pub name: String,
    pub id: String,

    /// Credited artists, in catalog order.
    pub artists: Vec<CatalogArtist>,

    /// Absent for tracks taken from an album listing.
    #[serde(default)]
    pub album: Option<CatalogAlbum>,
}

impl CatalogSongInfo {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            artists: Vec::new(),
            album: None,
        }
    }

    #[must_use]
    pub fn with_artist(mut self, artist: CatalogArtist) -> Self {
        self.artists.push(artist);
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: CatalogAlbum) -> Self {
        self.album = Some(album);
        self
    }

    /// All credited artist names joined by single spaces.
    #[must_use]
    pub fn joined_artist_names(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
