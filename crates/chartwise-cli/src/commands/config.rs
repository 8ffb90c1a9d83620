use anyhow::Result;
use chartwise_etl::{config, Config};

/// Show the current effective configuration.
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Current Configuration");
    println!("=====================\n");

    println!("Config file: {}", config::config_file_path().display());

    let exists = config::config_file_path().exists();
    println!("File exists: {}\n", if exists { "yes" } else { "no (using defaults)" });

    println!("Settings:");
    println!("  client_id: {}", config.client_id.as_deref().unwrap_or("<not set>"));
    println!(
        "  client_secret: {}",
        if config.client_secret.is_some() { "<set>" } else { "<not set>" }
    );
    println!("  matches_path: {}", config.matches_path.display());
    println!("  features_path: {}", config.features_path.display());
    println!("  expanded_path: {}", config.expanded_path.display());
    println!("  expanded_features_path: {}", config.expanded_features_path.display());
    println!("  search_limit: {}", config.search_limit);
    println!("  exact_ratio: {}", config.exact_ratio);
    println!("  fuzzy_ratio: {}", config.fuzzy_ratio);
    println!("  exact_artist_ratio: {}", config.exact_artist_ratio);
    println!("  flush_every: {}", config.flush_every);
    println!("  feature_batch_size: {}", config.feature_batch_size);
    println!("  album_sample_size: {}", config.album_sample_size);
    println!("  retry: {:?}", config.retry_policy());
    println!("  request_timeout_secs: {}", config.request_timeout_secs);
    println!("  requests_per_second: {}", config.requests_per_second);
    println!("  exhaustion_policy: {:?}", config.exhaustion_policy);
    println!("  blacklist: {:?}", config.blacklist);
    println!("  whitelist: {:?}", config.whitelist);

    println!("\nPriority: CLI args > ENV vars (CHARTWISE_*) > Config file > Defaults");

    Ok(())
}

/// Show the config file path.
pub fn show_path() -> Result<()> {
    println!("{}", config::config_file_path().display());
    Ok(())
}

/// Show example configuration.
pub fn show_example() -> Result<()> {
    print!("{}", config::example_config());
    Ok(())
}

/// Initialize config file with defaults.
pub fn init_config() -> Result<()> {
    let created = config::ensure_config_file()?;
    let config_path = config::config_file_path();

    if created {
        println!("✓ Created config file: {}", config_path.display());
        println!("\nEdit this file to add your Spotify credentials.");
    } else {
        println!("Config file already exists: {}", config_path.display());
    }

    Ok(())
}
