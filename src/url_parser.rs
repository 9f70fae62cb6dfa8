//! URL parser for extracting spreadsheet and document IDs from Google URLs.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Result, WorkspaceError};

/// `docs.google.com/spreadsheets/d/<ID>` and `docs.google.com/document/d/<ID>`,
/// optionally with a `/u/<n>/` account segment.
static DOCS_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https?://docs\.google\.com/(?:u/\d+/)?(?:spreadsheets|document)/d/([a-zA-Z0-9_-]+)",
    )
    .expect("Invalid docs URL regex")
});

/// Valid Google file ID pattern (alphanumeric, underscore, hyphen).
static ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("Invalid ID regex"));

/// Extract a spreadsheet or document ID from a URL or validate a raw ID.
///
/// Supports the following formats:
/// - `https://docs.google.com/spreadsheets/d/<ID>/edit#gid=0`
/// - `https://docs.google.com/document/d/<ID>/edit`
/// - Raw ID string
///
/// # Examples
///
/// ```
/// use workspace_sync::url_parser::extract_id;
///
/// let id = extract_id("https://docs.google.com/document/d/1abc123/edit").unwrap();
/// assert_eq!(id, "1abc123");
///
/// let id = extract_id("1abc123").unwrap();
/// assert_eq!(id, "1abc123");
/// ```
pub fn extract_id(url_or_id: &str) -> Result<String> {
    let trimmed = url_or_id.trim();

    if let Some(id) = DOCS_URL_REGEX
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
    {
        return Ok(id.as_str().to_string());
    }

    if ID_REGEX.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    Err(WorkspaceError::InvalidUrlOrId(url_or_id.to_string()))
}
