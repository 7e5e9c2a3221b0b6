use std::path::PathBuf;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::download::{self, LogProgress};
use crate::storage::{History, StorageError};
use crate::util::sanitize_title;

use super::parser::{EntryLink, FeedEntry};

/// Emitted after each successful download; the run loop forwards these to
/// the configured notifiers. Carries the sanitized title, which is what a
/// human notification should show. Never persisted.
#[derive(Debug, Clone)]
pub struct DownloadEvent {
    pub feed: String,
    pub title: String,
}

/// Decide whether one entry should be downloaded, and do it.
///
/// The decision sequence, each step short-circuiting to "skip":
///
/// 1. whitelist match on the raw title (when a whitelist is configured)
/// 2. history lookup on (feed name, raw title)
/// 3. enclosure link selection (first link with rel="enclosure")
/// 4. output-path existence check on disk
/// 5. download, then record history
///
/// Returns `Ok(Some(event))` after a successful download, `Ok(None)` for
/// every kind of skip. Download failures are logged and become `Ok(None)`
/// without a history record, so the entry is retried on the next run. Only
/// a history-store failure propagates: the run cannot continue correctly
/// without it.
pub async fn process_entry(
    client: &reqwest::Client,
    history: &History,
    feed: &FeedConfig,
    entry: &FeedEntry,
    timeout: Duration,
) -> Result<Option<DownloadEvent>, StorageError> {
    let clean_title = sanitize_title(&entry.title);
    tracing::debug!(feed = %feed.name, title = %clean_title, "Considering entry");

    if !feed.whitelist.is_empty()
        && !feed.whitelist.iter().any(|p| p.is_match(&entry.title))
    {
        tracing::debug!(feed = %feed.name, title = %clean_title, "Skipping entry, no whitelist match");
        return Ok(None);
    }

    if let Some(at) = history.has(&feed.name, &entry.title).await? {
        tracing::debug!(feed = %feed.name, title = %clean_title, downloaded_at = %at, "Skipping entry, already downloaded");
        return Ok(None);
    }

    let Some(link) = select_enclosure(&entry.links) else {
        tracing::warn!(feed = %feed.name, title = %clean_title, "Skipping entry, no valid enclosure link");
        return Ok(None);
    };

    let Some(dest) = output_path(feed, &clean_title, link) else {
        tracing::warn!(feed = %feed.name, title = %clean_title, "Skipping entry, enclosure has no usable media type");
        return Ok(None);
    };

    // Second idempotence check, independent of the history store: a file
    // already at the output path means this item is done.
    if dest.exists() {
        tracing::debug!(feed = %feed.name, path = %dest.display(), "Skipping entry, output path exists");
        return Ok(None);
    }

    tracing::info!(feed = %feed.name, title = %clean_title, "Downloading entry");
    let mut progress = LogProgress::default();
    match download::download(client, &link.href, &feed.auth, &dest, timeout, &mut progress).await {
        Ok(bytes) => {
            tracing::debug!(feed = %feed.name, bytes, path = %dest.display(), "Download complete");
        }
        Err(e) => {
            // No history record: the entry stays pending and is retried
            // on the next run.
            tracing::warn!(feed = %feed.name, title = %clean_title, error = %e, "Skipping entry, download failed");
            return Ok(None);
        }
    }

    history.record(&feed.name, &link.href, &entry.title).await?;

    Ok(Some(DownloadEvent {
        feed: feed.name.clone(),
        title: clean_title,
    }))
}

/// First link whose relation is "enclosure" with a non-empty href, in the
/// order the feed listed them.
fn select_enclosure(links: &[EntryLink]) -> Option<&EntryLink> {
    links.iter().find(|l| l.is_enclosure())
}

/// `<output dir>/<sanitized title>.<mime subtype>`. Returns `None` when the
/// enclosure carries no media type to derive an extension from.
fn output_path(feed: &FeedConfig, clean_title: &str, link: &EntryLink) -> Option<PathBuf> {
    let subtype = link
        .media_type
        .as_deref()
        .and_then(|m| m.rsplit('/').next())
        .filter(|s| !s.is_empty())?;
    Some(feed.output_dir.join(format!("{}.{}", clean_title, subtype)))
}
