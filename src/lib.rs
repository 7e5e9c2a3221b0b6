//! podpull — a personal podcast/feed downloader.
//!
//! podpull polls a set of configured RSS/Atom feeds, filters entries against
//! per-feed whitelist patterns, downloads not-yet-seen enclosure attachments
//! into per-feed output folders, and records each download in a local SQLite
//! history store so nothing is fetched twice. Successful downloads can be
//! pushed to notifiers (currently Pushbullet).
//!
//! Processing is fully sequential: feeds one at a time, entries within a
//! feed one at a time. The async style is an I/O convenience, not a
//! concurrency mechanism — every await completes before the next operation
//! starts, and running two podpull processes against the same history store
//! or output directory is out of contract.

pub mod config;
pub mod download;
pub mod feed;
pub mod notify;
pub mod run;
pub mod storage;
pub mod util;
