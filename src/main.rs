use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use podpull::config::{self, Config};
use podpull::notify;
use podpull::run;
use podpull::storage::History;

/// Get the config directory path (~/.config/podpull/)
fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("podpull"))
}

#[derive(Parser, Debug)]
#[command(
    name = "podpull",
    about = "Personal podcast downloader: fetch new feed enclosures"
)]
struct Args {
    /// Config file (default: ~/.config/podpull/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// History database (default: the config's `history` key, or
    /// ~/.config/podpull/history.db)
    #[arg(long, value_name = "FILE")]
    history: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins when set; otherwise --verbose picks the default level
    let default_filter = if args.verbose {
        "podpull=debug"
    } else {
        "podpull=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let dir = config_dir()?;
    let config_path = args.config.unwrap_or_else(|| dir.join("config.toml"));

    tracing::info!(start = %chrono::Utc::now(), config = %config_path.display(), "Starting run");

    let config = Config::load(&config_path)
        .with_context(|| format!("Unable to load config file {}", config_path.display()))?;

    // CLI flag wins over the config key, which wins over the default
    let history_path = args
        .history
        .or_else(|| config.history.as_deref().map(config::expand_home))
        .unwrap_or_else(|| dir.join("history.db"));
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let history_path = history_path
        .to_str()
        .context("Invalid UTF-8 in history path")?;

    let history = History::open(history_path)
        .await
        .context("Unable to initialize download history")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let notifiers = notify::build_notifiers(&client, &config.notifiers);

    let summary = run::run(&client, &history, &config, &notifiers).await?;

    history.close().await;

    tracing::info!(
        feeds = summary.feeds_processed,
        skipped = summary.feeds_skipped,
        downloads = summary.downloads,
        end = %chrono::Utc::now(),
        "Run finished"
    );
    Ok(())
}
