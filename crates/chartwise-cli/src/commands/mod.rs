pub mod config;
pub mod expand;
pub mod features;
pub mod resolve;
pub mod status;

pub use expand::run_expand;
pub use features::run_features;
pub use resolve::run_resolve;
pub use status::show_status;

use anyhow::{Context, Result};
use chartwise_etl::{Config, QueryClient, SpotifyClient};

/// Build the retrying Spotify client described by `config`.
fn spotify_client(config: &Config) -> Result<QueryClient<SpotifyClient>> {
    let catalog = SpotifyClient::new(
        config.credentials()?,
        config.request_timeout(),
        config.requests_per_second,
    )
    .context("Failed to create Spotify client")?;

    Ok(QueryClient::new(catalog, config.retry_policy()))
}
