use unicode_normalization::UnicodeNormalization;

/// Reduces a feed entry title to a filesystem-safe form.
///
/// The title is NFKD-decomposed so accented characters fall apart into a
/// base character plus combining marks, then everything outside ASCII
/// alphanumerics, whitespace and `-` is dropped, whitespace runs collapse
/// to a single space, and the result is trimmed.
///
/// The sanitized title is used for logging and for building the output
/// filename only — the raw title remains the history lookup key.
///
/// # Examples
///
/// ```
/// use podpull::util::sanitize_title;
///
/// assert_eq!(sanitize_title("Épisode 1: déjà vu"), "Episode 1 deja vu");
/// assert_eq!(sanitize_title("  spaced\t\tout  "), "spaced out");
/// ```
pub fn sanitize_title(raw: &str) -> String {
    let kept: String = raw
        .nfkd()
        .filter(|c| c.is_ascii())
        .filter(|c| c.is_ascii_alphanumeric() || c.is_ascii_whitespace() || *c == '-')
        .collect();

    // split_whitespace both collapses runs and drops leading/trailing
    // whitespace, so a single join finishes the job.
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
