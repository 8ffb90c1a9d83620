use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use chartwise_etl::Config;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "chartwise", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the snapshot files (default: ~/.local/share/chartwise)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Resolve chart records to catalog songs
    ///
    /// Reads a JSON array of chart records and matches each distinct
    /// (song, artist) pair against the catalog in two passes:
    ///
    /// - Strict: search the title alone and require an exact title match
    /// - Permissive: search "title artist" and accept fuzzy matches
    ///
    /// Records already in the match snapshot are skipped, so the command can
    /// be re-run on a growing chart file and only new entries are queried.
    /// Progress is flushed to disk periodically.
    Resolve {
        /// Path to the chart records (JSON array)
        charts: PathBuf,
    },
    /// Fetch audio features for resolved songs
    Features {
        /// Use the album-expanded songs instead of the charted ones
        #[arg(long)]
        expanded: bool,
    },
    /// Sample sibling tracks from the albums of resolved songs
    Expand {
        /// Tracks drawn per album (default from config)
        #[arg(long)]
        sample_size: Option<usize>,
        /// Seed for reproducible sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Show snapshot status
    Status,
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Create the config file with defaults
    Init,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Commands::Config(command) = &cli.command {
        return match command {
            ConfigCommand::Show => commands::config::show_config(),
            ConfigCommand::Init => commands::config::init_config(),
            ConfigCommand::Path => commands::config::show_path(),
            ConfigCommand::Example => commands::config::show_example(),
        };
    }

    let mut config = Config::load()?;
    if let Some(dir) = &cli.store_dir {
        config = config.with_store_dir(dir);
    }

    match cli.command {
        Commands::Resolve { charts } => {
            commands::run_resolve(&config, &charts).await?;
        }
        Commands::Features { expanded } => {
            commands::run_features(&config, expanded).await?;
        }
        Commands::Expand { sample_size, seed } => {
            commands::run_expand(&config, sample_size, seed).await?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
