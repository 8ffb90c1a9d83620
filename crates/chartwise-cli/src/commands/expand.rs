use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use chartwise_core::MatchStore;
use chartwise_etl::{AlbumSampler, Config, MatchEvaluator};

pub async fn run_expand(
    config: &Config,
    sample_size: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let songs = MatchStore::open(&config.matches_path)?;
    if songs.is_empty() {
        println!("No songs in {}", config.matches_path.display());
        println!("\nRun `chartwise resolve` first");
        return Ok(());
    }

    let mut store = MatchStore::open(&config.expanded_path)?;
    let client = super::spotify_client(config)?;
    let sampler = AlbumSampler::new(
        sample_size.unwrap_or(config.album_sample_size),
        MatchEvaluator::new(&config.match_rules()),
    );
    let mut rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

    let report = sampler
        .run(&client, songs.values(), &mut store, &mut rng)
        .await
        .context("Album expansion stopped")?;

    println!("\n✓ Expansion complete\n");
    println!("  Albums visited:  {}", report.albums_visited);
    println!("  Without album:   {}", report.without_album);
    println!("  Tracks sampled:  {}", report.sampled);
    println!("  Blacklisted:     {}", report.blacklisted);
    println!("  Source songs:    {}", report.self_excluded);
    println!("  Stored:          {}", report.stored);
    println!("\n  Snapshot: {} ({} songs)", store.path().display(), store.len());

    Ok(())
}
