//! Utility functions for common operations.
//!
//! Currently this is title sanitization: turning arbitrary feed entry
//! titles into strings that are safe to use as file names.

mod text;

pub use text::sanitize_title;
