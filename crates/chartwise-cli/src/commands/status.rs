use anyhow::Result;

use chartwise_core::{FeatureStore, MatchStore};
use chartwise_etl::Config;

pub fn show_status(config: &Config) -> Result<()> {
    let matches = MatchStore::open(&config.matches_path)?;
    let features = FeatureStore::open(&config.features_path)?;
    let expanded = MatchStore::open(&config.expanded_path)?;
    let expanded_features = FeatureStore::open(&config.expanded_features_path)?;

    println!("\n📊 Chartwise Status\n");
    println!("  Resolved songs:      {} ({})", matches.len(), matches.path().display());
    print_features("Features", &features, &matches);
    println!("  Expanded songs:      {} ({})", expanded.len(), expanded.path().display());
    print_features("Expanded features", &expanded_features, &expanded);

    let fuzzy = matches
        .values()
        .filter(|song| song.min_ratio.is_some_and(|ratio| ratio < config.exact_ratio))
        .count();
    if fuzzy > 0 {
        println!("\n  {} resolved songs were fuzzy matches", fuzzy);
    }

    let missing = matches
        .values()
        .filter(|song| !features.contains_key(&song.song.id))
        .count();
    if missing > 0 {
        println!("\n  Run `chartwise features` to fetch features for {} songs", missing);
    }

    Ok(())
}

fn print_features(label: &str, features: &FeatureStore, songs: &MatchStore) {
    let with_data = features.values().filter(|record| record.has_features()).count();
    println!(
        "  {:<20} {} of {} songs, {} with data ({})",
        format!("{label}:"),
        features.len(),
        songs.len(),
        with_data,
        features.path().display()
    );
}
