//! Spotify Web API catalog.
//!
//! Authenticates with the client-credentials flow and caches the access
//! token until shortly before it expires. Requests are spaced by a
//! [`RateLimiter`]; a single client never has more than one request in
//! flight.
//!
//! [`RateLimiter`]: crate::resilience::RateLimiter

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;

use chartwise_core::model::{CatalogAlbum, CatalogArtist, CatalogSongInfo, FeatureVector};

use crate::catalog::{Catalog, TrackFeatures, MAX_FEATURE_BATCH};
use crate::error::{CatalogError, CatalogResult};
use crate::resilience::RateLimiter;

const SOURCE_NAME: &str = "Spotify";
const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are refreshed this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Page size used when listing album tracks (the API maximum).
const ALBUM_PAGE_SIZE: &str = "50";

// ---------------------------------------------------------------------------
// Wire types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Paging<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct Paging<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    /// Null for local files.
    id: Option<String>,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    album: Option<AlbumObject>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    id: Option<String>,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    id: String,
    name: String,
    #[serde(default)]
    total_tracks: u32,
    #[serde(default)]
    release_date: String,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesResponse {
    audio_features: Vec<Option<AudioFeaturesObject>>,
}

#[derive(Debug, Deserialize)]
struct AudioFeaturesObject {
    id: String,
    time_signature: i32,
    duration_ms: u64,
    key: i32,
    mode: i32,
    acousticness: f64,
    danceability: f64,
    energy: f64,
    instrumentalness: f64,
    liveness: f64,
    loudness: f64,
    speechiness: f64,
    valence: f64,
    tempo: f64,
}

impl TrackObject {
    fn into_song_info(self) -> Option<CatalogSongInfo> {
        let id = self.id?;
        Some(CatalogSongInfo {
            name: self.name,
            id,
            artists: self
                .artists
                .into_iter()
                .map(|artist| CatalogArtist {
                    name: artist.name,
                    id: artist.id.unwrap_or_default(),
                })
                .collect(),
            album: self.album.map(|album| CatalogAlbum {
                name: album.name,
                id: album.id,
                total_tracks: album.total_tracks,
                release_date: album.release_date,
            }),
        })
    }
}

impl From<AudioFeaturesObject> for TrackFeatures {
    fn from(raw: AudioFeaturesObject) -> Self {
        Self {
            id: raw.id,
            features: FeatureVector {
                time_signature: raw.time_signature,
                duration_ms: raw.duration_ms,
                key: raw.key,
                mode: raw.mode,
                acousticness: raw.acousticness,
                danceability: raw.danceability,
                energy: raw.energy,
                instrumentalness: raw.instrumentalness,
                liveness: raw.liveness,
                loudness: raw.loudness,
                speechiness: raw.speechiness,
                valence: raw.valence,
                tempo: raw.tempo,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Application credentials for the client-credentials flow.
#[derive(Clone)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Spotify Web API client.
#[derive(Debug)]
pub struct SpotifyClient {
    http: Client,
    credentials: SpotifyCredentials,
    token: Mutex<Option<AccessToken>>,
    rate_limiter: RateLimiter,
}

impl SpotifyClient {
    /// Create a new Spotify client.
    ///
    /// `timeout` bounds every individual HTTP request; a request that
    /// exceeds it fails with [`CatalogError::Timeout`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(
        credentials: SpotifyCredentials,
        timeout: Duration,
        requests_per_second: u32,
    ) -> CatalogResult<Self> {
        let http = Client::builder()
            .user_agent(concat!("chartwise/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            credentials,
            token: Mutex::new(None),
            rate_limiter: RateLimiter::new(requests_per_second),
        })
    }

    /// Return a valid access token, fetching a new one when needed.
    async fn access_token(&self) -> CatalogResult<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        log::debug!("Requesting new {} access token", SOURCE_NAME);
        self.rate_limiter.acquire().await;
        let response = self
            .http
            .post(TOKEN_URL)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Auth {
                source_name: SOURCE_NAME.to_string(),
                message: format!("{status}: {body}"),
            });
        }

        let body: TokenResponse = response.json().await.map_err(parse_error)?;
        let lifetime = Duration::from_secs(body.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        let value = body.access_token;
        *cached = Some(AccessToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(value)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> CatalogResult<T> {
        let token = self.access_token().await?;
        self.rate_limiter.acquire().await;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(request_error)?;

        let response = self.check_status(response).await?;
        response.json::<T>().await.map_err(parse_error)
    }

    async fn check_status(&self, response: Response) -> CatalogResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(CatalogError::RateLimited {
                source_name: SOURCE_NAME.to_string(),
                retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED {
            // Force a fresh token on the next call.
            self.token.lock().await.take();
        }

        let message = response.text().await.unwrap_or_default();
        Err(CatalogError::Http {
            source_name: SOURCE_NAME.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Catalog for SpotifyClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, query: &str, limit: u32) -> CatalogResult<Vec<CatalogSongInfo>> {
        let limit = limit.to_string();
        let response: SearchResponse = self
            .get_json(
                &format!("{API_BASE}/search"),
                &[("q", query), ("type", "track"), ("limit", limit.as_str())],
            )
            .await?;

        Ok(response
            .tracks
            .items
            .into_iter()
            .filter_map(TrackObject::into_song_info)
            .collect())
    }

    async fn features(&self, ids: &[String]) -> CatalogResult<Vec<Option<TrackFeatures>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_FEATURE_BATCH {
            return Err(CatalogError::Parse {
                source_name: SOURCE_NAME.to_string(),
                message: format!(
                    "feature batch of {} ids exceeds the limit of {MAX_FEATURE_BATCH}",
                    ids.len()
                ),
            });
        }

        let joined = ids.join(",");
        let response: AudioFeaturesResponse = self
            .get_json(&format!("{API_BASE}/audio-features"), &[("ids", joined.as_str())])
            .await?;

        Ok(response
            .audio_features
            .into_iter()
            .map(|slot| slot.map(TrackFeatures::from))
            .collect())
    }

    async fn album_tracks(&self, album_id: &str) -> CatalogResult<Vec<CatalogSongInfo>> {
        let mut page: Paging<TrackObject> = self
            .get_json(
                &format!("{API_BASE}/albums/{album_id}/tracks"),
                &[("limit", ALBUM_PAGE_SIZE)],
            )
            .await?;

        let mut tracks = Vec::new();
        loop {
            tracks.extend(page.items.into_iter().filter_map(TrackObject::into_song_info));
            match page.next {
                Some(next) => page = self.get_json(&next, &[]).await?,
                None => break,
            }
        }

        Ok(tracks)
    }
}

fn request_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout {
            source_name: SOURCE_NAME.to_string(),
        }
    } else {
        CatalogError::Request(e)
    }
}

fn parse_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        return CatalogError::Timeout {
            source_name: SOURCE_NAME.to_string(),
        };
    }
    CatalogError::Parse {
        source_name: SOURCE_NAME.to_string(),
        message: e.to_string(),
    }
}
