use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::config::{FeedAuth, FeedConfig};

use super::parser::{parse_entries, FeedEntry};

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors from fetching a feed index or an enclosure.
///
/// None of these are retried within a run: an index failure skips the
/// whole feed, a download failure skips the item (which is retried on the
/// next run because no history record is written).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Feed body could not be parsed as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// Feed body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Writing a downloaded body to disk failed
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Apply a feed's auth settings to a request.
///
/// Basic credentials and query parameters are mutually exclusive by
/// construction: [`FeedAuth`] is a closed variant resolved at config load,
/// so there is no precedence decision left to make here.
pub(crate) fn apply_auth(
    request: reqwest::RequestBuilder,
    auth: &FeedAuth,
) -> reqwest::RequestBuilder {
    match auth {
        FeedAuth::None => request,
        FeedAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
        FeedAuth::QueryParams(params) => request.query(params),
    }
}

/// Fetch and parse one feed's index.
///
/// Issues a single GET (the client carries the identifying user-agent) with
/// the feed's auth applied, and parses the body into the entry list.
///
/// # Errors
///
/// - [`FetchError::Timeout`] / [`FetchError::Network`] - request never completed
/// - [`FetchError::HttpStatus`] - non-2xx response
/// - [`FetchError::ResponseTooLarge`] - body over 10MB
/// - [`FetchError::Parse`] - body is not a parseable RSS/Atom document
///
/// The caller skips the whole feed for this run on any of these.
pub async fn fetch_index(
    client: &reqwest::Client,
    feed: &FeedConfig,
    timeout: Duration,
) -> Result<Vec<FeedEntry>, FetchError> {
    tracing::debug!(feed = %feed.name, url = %feed.url, "Fetching feed index");

    let request = apply_auth(client.get(feed.url.clone()), &feed.auth);
    let response = tokio::time::timeout(timeout, request.send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;
    parse_entries(&bytes)
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
