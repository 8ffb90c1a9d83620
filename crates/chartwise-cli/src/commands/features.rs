use anyhow::{Context, Result};

use chartwise_core::{FeatureStore, MatchStore};
use chartwise_etl::{Config, FeatureBatchFetcher};

pub async fn run_features(config: &Config, expanded: bool) -> Result<()> {
    let (source_path, target_path) = if expanded {
        (&config.expanded_path, &config.expanded_features_path)
    } else {
        (&config.matches_path, &config.features_path)
    };

    let songs = MatchStore::open(source_path)?;
    if songs.is_empty() {
        println!("No songs in {}", source_path.display());
        println!("\nRun `chartwise resolve` first");
        return Ok(());
    }

    let mut store = FeatureStore::open(target_path)?;
    let client = super::spotify_client(config)?;

    let report = FeatureBatchFetcher::new(config.feature_batch_size)
        .run(&client, songs.values(), &mut store)
        .await
        .context("Feature fetching stopped")?;

    println!("\n✓ Features complete\n");
    println!("  Songs:            {}", report.requested);
    println!("  Already fetched:  {}", report.skipped);
    println!("  Stored:           {}", report.stored);
    println!("  Without features: {}", report.empty);
    if report.realigned > 0 || report.unknown > 0 {
        println!("  Realigned:        {}", report.realigned);
        println!("  Unknown ids:      {}", report.unknown);
    }
    println!("\n  Snapshot: {} ({} songs)", store.path().display(), store.len());

    Ok(())
}
