use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chartwise_core::model::ChartRecord;
use chartwise_core::MatchStore;
use chartwise_etl::{Config, MatchEvaluator, ResolutionEngine};

pub async fn run_resolve(config: &Config, charts_path: &Path) -> Result<()> {
    let file = File::open(charts_path)
        .with_context(|| format!("Failed to open chart file {}", charts_path.display()))?;
    let records: Vec<ChartRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse chart file {}", charts_path.display()))?;

    log::info!("Loaded {} chart records from {}", records.len(), charts_path.display());

    let mut store = MatchStore::open(&config.matches_path)?;
    let client = super::spotify_client(config)?;
    let engine = ResolutionEngine::new(
        MatchEvaluator::new(&config.match_rules()),
        config.resolve_settings(),
    );

    let report = engine
        .run(&client, &records, &mut store)
        .await
        .context("Resolution stopped")?;

    println!("\n✓ Resolution complete\n");
    println!("  Chart records:   {}", report.input);
    println!("  Unique songs:    {}", report.unique);
    println!("  Already stored:  {}", report.already_stored);
    println!("  Exact matches:   {}", report.exact_matches);
    println!("  Fuzzy matches:   {}", report.fuzzy_matches);
    println!("  Unmatched:       {}", report.unmatched);
    if report.failed > 0 {
        println!("  Failed:          {}", report.failed);
    }
    println!("  Catalog queries: {}", report.queries);
    println!("\n  Snapshot: {} ({} songs)", store.path().display(), store.len());

    Ok(())
}
