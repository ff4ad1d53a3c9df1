//! Shared utility functions used across multiple modules.

use std::sync::OnceLock;

use regex::Regex;

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Check if a string starts with `http://` or `https://`.
pub fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

/// Truncate text to at most 180 characters for error messages.
pub fn compact_text(value: &str) -> String {
    value.trim().chars().take(180).collect()
}

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Turn a human title into a lowercase, dash-separated file name stem.
///
/// Falls back to `untitled` when nothing alphanumeric remains.
///
/// # Examples
///
/// ```
/// use notesync_core::util::slugify;
///
/// assert_eq!(slugify("Shopping List: Week 3!"), "shopping-list-week-3");
/// assert_eq!(slugify("  ***  "), "untitled");
/// ```
pub fn slugify(value: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("Invalid regex"));

    let lowered = value.trim().to_lowercase();
    let slug = re.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug.to_string()
    }
}

/// Join path segments with single slashes, dropping empty segments.
pub fn join_remote_path(base: &str, path: &str) -> String {
    base.split('/')
        .chain(path.split('/'))
        .filter(|segment| !segment.trim().is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
