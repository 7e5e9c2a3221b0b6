//! Feed fetching, parsing, and the per-entry decision pipeline.
//!
//! - [`parser`] turns a feed's wire payload into [`FeedEntry`] values
//! - [`fetcher`] issues the index GET with per-feed auth applied
//! - [`pipeline`] decides, for each entry, whether to download it

mod fetcher;
mod parser;
mod pipeline;

pub(crate) use fetcher::apply_auth;
pub use fetcher::{fetch_index, FetchError};
pub use parser::{parse_entries, EntryLink, FeedEntry};
pub use pipeline::{process_entry, DownloadEvent};
