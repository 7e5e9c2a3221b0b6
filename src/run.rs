//! The sequential run loop.
//!
//! Feeds are processed one at a time in config order (sorted by name),
//! entries within a feed one at a time, oldest first. Per-feed and
//! per-item failures degrade to skip-and-continue; only a history-store
//! failure aborts, because without the store every download decision
//! would be wrong.

use std::time::Duration;

use crate::config::Config;
use crate::feed::{fetch_index, process_entry};
use crate::notify::Notifier;
use crate::storage::{History, StorageError};

/// Totals for the end-of-run report.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunSummary {
    pub feeds_processed: usize,
    pub feeds_skipped: usize,
    pub downloads: u64,
}

/// Drive one full run over every configured feed.
pub async fn run(
    client: &reqwest::Client,
    history: &History,
    config: &Config,
    notifiers: &[Box<dyn Notifier>],
) -> Result<RunSummary, StorageError> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    let mut summary = RunSummary::default();

    for (name, raw) in &config.feeds {
        tracing::info!(feed = %name, "Processing feed");

        let feed = match raw.resolve(name) {
            Ok(feed) => feed,
            Err(e) => {
                tracing::warn!(feed = %name, error = %e, "Skipping feed, invalid configuration");
                summary.feeds_skipped += 1;
                continue;
            }
        };

        if let Err(e) = std::fs::create_dir_all(&feed.output_dir) {
            tracing::warn!(
                feed = %name,
                path = %feed.output_dir.display(),
                error = %e,
                "Skipping feed, cannot create output directory"
            );
            summary.feeds_skipped += 1;
            continue;
        }

        let entries = match fetch_index(client, &feed, timeout).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(feed = %name, error = %e, "Skipping feed, index fetch failed");
                summary.feeds_skipped += 1;
                continue;
            }
        };
        tracing::debug!(feed = %name, entries = entries.len(), "Fetched feed index");

        let mut downloads = 0u64;
        // Oldest unseen items first: feeds list newest entries at the top
        for entry in entries.iter().rev() {
            if let Some(event) = process_entry(client, history, &feed, entry, timeout).await? {
                for notifier in notifiers {
                    notifier.notify(&event.feed, &event.title).await;
                }
                downloads += 1;
            }
        }

        tracing::info!(feed = %name, downloads, "Feed complete");
        summary.feeds_processed += 1;
        summary.downloads += downloads;
    }

    Ok(summary)
}
