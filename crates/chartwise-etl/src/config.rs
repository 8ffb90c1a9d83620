use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::spotify::SpotifyCredentials;
use crate::catalog::MAX_FEATURE_BATCH;
use crate::matching::{MatchRules, EXACT_RATIO};
use crate::resilience::RetryPolicy;
use crate::resolve::{ExhaustionPolicy, ResolveSettings};

/// Configuration for chartwise.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (CHARTWISE_* prefix)
/// 3. Config file (~/.config/chartwise/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Spotify client id.
    ///
    /// Can be set via:
    /// - ENV: CHARTWISE_CLIENT_ID
    /// - Config: client_id = "..."
    pub client_id: Option<String>,

    /// Spotify client secret.
    ///
    /// Can be set via:
    /// - ENV: CHARTWISE_CLIENT_SECRET
    /// - Config: client_secret = "..."
    pub client_secret: Option<String>,

    /// Snapshot of resolved chart songs.
    ///
    /// Default: ~/.local/share/chartwise/matches.json
    pub matches_path: PathBuf,
    /// Snapshot of features for resolved chart songs.
    pub features_path: PathBuf,
    /// Snapshot of album-expanded songs.
    pub expanded_path: PathBuf,
    /// Snapshot of features for album-expanded songs.
    pub expanded_features_path: PathBuf,

    /// Candidates requested per search.
    pub search_limit: u32,
    /// Title threshold of the strict pass; 100 requires equal titles.
    pub exact_ratio: u8,
    /// Title and artist threshold of the permissive pass.
    pub fuzzy_ratio: u8,
    /// Artist threshold used alongside exact title matching.
    pub exact_artist_ratio: u8,
    /// Records processed between store flushes.
    pub flush_every: usize,
    pub feature_batch_size: usize,
    pub album_sample_size: usize,

    pub retry_max_attempts: u32,
    pub retry_min_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    pub retry_factor: f32,
    pub retry_jitter: bool,

    pub request_timeout_secs: u64,
    pub requests_per_second: u32,
    /// `abort` or `skip_record`.
    pub exhaustion_policy: ExhaustionPolicy,

    /// Words that disqualify a catalog track name.
    pub blacklist: Vec<String>,
    /// Phrases that lift the blacklist.
    pub whitelist: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let rules = MatchRules::default();
        let retry = RetryPolicy::default();
        let resolve = ResolveSettings::default();
        let data_dir = default_data_dir();

        Self {
            client_id: None,
            client_secret: None,
            matches_path: data_dir.join(MATCHES_FILE),
            features_path: data_dir.join(FEATURES_FILE),
            expanded_path: data_dir.join(EXPANDED_FILE),
            expanded_features_path: data_dir.join(EXPANDED_FEATURES_FILE),
            search_limit: resolve.search_limit,
            exact_ratio: EXACT_RATIO,
            fuzzy_ratio: resolve.fuzzy_ratio,
            exact_artist_ratio: rules.exact_artist_ratio,
            flush_every: resolve.flush_every,
            feature_batch_size: MAX_FEATURE_BATCH,
            album_sample_size: 5,
            retry_max_attempts: retry.max_attempts,
            retry_min_delay_ms: retry.min_delay_ms,
            retry_max_delay_ms: retry.max_delay_ms,
            retry_factor: retry.factor,
            retry_jitter: retry.jitter,
            request_timeout_secs: 10,
            requests_per_second: 10,
            exhaustion_policy: resolve.exhaustion,
            blacklist: rules.blacklist,
            whitelist: rules.whitelist,
        }
    }
}

const MATCHES_FILE: &str = "matches.json";
const FEATURES_FILE: &str = "features.json";
const EXPANDED_FILE: &str = "expanded.json";
const EXPANDED_FEATURES_FILE: &str = "expanded_features.json";

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/chartwise/config.toml
    /// Reads environment variables with CHARTWISE_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .with_context(|| format!("Failed to load config file {}", config_path.display()))?;
        }

        let env_opts = env::Options::with_top_level("chartwise");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Move every snapshot into `dir`, keeping the file names.
    ///
    /// This is used when the --store-dir CLI flag is provided.
    #[must_use]
    pub fn with_store_dir(mut self, dir: &Path) -> Self {
        self.matches_path = dir.join(MATCHES_FILE);
        self.features_path = dir.join(FEATURES_FILE);
        self.expanded_path = dir.join(EXPANDED_FILE);
        self.expanded_features_path = dir.join(EXPANDED_FEATURES_FILE);
        self
    }

    /// Spotify credentials, failing when either half is missing.
    pub fn credentials(&self) -> Result<SpotifyCredentials> {
        let client_id = self
            .client_id
            .clone()
            .filter(|id| !id.is_empty())
            .context("Missing Spotify client id (set client_id or CHARTWISE_CLIENT_ID)")?;
        let client_secret = self
            .client_secret
            .clone()
            .filter(|secret| !secret.is_empty())
            .context(
                "Missing Spotify client secret (set client_secret or CHARTWISE_CLIENT_SECRET)",
            )?;

        Ok(SpotifyCredentials {
            client_id,
            client_secret,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            min_delay_ms: self.retry_min_delay_ms,
            max_delay_ms: self.retry_max_delay_ms,
            factor: self.retry_factor,
            jitter: self.retry_jitter,
        }
    }

    pub fn match_rules(&self) -> MatchRules {
        MatchRules {
            blacklist: self.blacklist.clone(),
            whitelist: self.whitelist.clone(),
            exact_artist_ratio: self.exact_artist_ratio,
        }
    }

    pub fn resolve_settings(&self) -> ResolveSettings {
        ResolveSettings {
            search_limit: self.search_limit,
            exact_ratio: self.exact_ratio,
            fuzzy_ratio: self.fuzzy_ratio,
            flush_every: self.flush_every,
            exhaustion: self.exhaustion_policy,
        }
    }
}

/// Get the default snapshot directory.
///
/// Returns: ~/.local/share/chartwise (or platform equivalent)
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chartwise")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/chartwise/config.toml
/// - macOS: ~/Library/Application Support/chartwise/config.toml
/// - Windows: %APPDATA%\chartwise\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chartwise")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Chartwise Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (CHARTWISE_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Spotify application credentials (client-credentials flow)
#
# Create an application at: https://developer.spotify.com/dashboard
#
# Can also be set via:
# - Environment: CHARTWISE_CLIENT_ID / CHARTWISE_CLIENT_SECRET
client_id = "your-client-id"
client_secret = "your-client-secret"

# Snapshot files
#
# Can also be moved together with:
# - CLI: chartwise --store-dir /custom/dir resolve charts.json
#
# Default: Platform-specific data directory
#matches_path = "/path/to/matches.json"
#features_path = "/path/to/features.json"
#expanded_path = "/path/to/expanded.json"
#expanded_features_path = "/path/to/expanded_features.json"

# Matching
#search_limit = 3
#exact_ratio = 100
#fuzzy_ratio = 90
#exact_artist_ratio = 95
#blacklist = ["Version", "Instrumental", "Emulation", "Remix"]
#whitelist = ["Taylor's Version"]

# Progress is flushed to disk every this many records
#flush_every = 5000

#feature_batch_size = 50
#album_sample_size = 5

# Remote calls
#request_timeout_secs = 10
#requests_per_second = 10
#retry_max_attempts = 10
#retry_min_delay_ms = 500
#retry_max_delay_ms = 30000
#retry_factor = 2.0
#retry_jitter = false

# What to do when the catalog stays unreachable: "abort" or "skip_record"
#exhaustion_policy = "abort"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
