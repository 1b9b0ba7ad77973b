//! Path guard
//!
//! Normalizes untrusted slash-delimited paths against a browsing root.
//! The same guard runs for URL paths and for every archive member name
//! before any byte is written: both come from the network and are trusted
//! to exactly the same degree.

use crate::error::BrowseError;

/// Normalize a request path from a URL.
///
/// Empty segments and `.` collapse; `..` pops the previous segment and is
/// rejected once the descent depth would go negative. NUL bytes are rejected
/// outright. The result is root-relative with `/` separators; an empty
/// string names the root itself.
pub fn normalize_request_path(raw: &str) -> Result<String, BrowseError> {
    normalize(raw, false)
}

/// Normalize an archive member path.
///
/// Identical to [`normalize_request_path`] except that `\` also separates
/// segments, since archives built on other platforms may use it.
pub fn normalize_member_path(raw: &str) -> Result<String, BrowseError> {
    normalize(raw, true)
}

fn normalize(raw: &str, backslash_separates: bool) -> Result<String, BrowseError> {
    if raw.contains('\0') {
        return Err(BrowseError::PathTraversal(raw.replace('\0', "\\0")));
    }

    let is_separator = |c: char| c == '/' || (backslash_separates && c == '\\');

    let mut segments: Vec<&str> = Vec::new();
    for segment in raw.split(is_separator) {
        match segment {
            "" | "." => continue,
            ".." => {
                // Depth must never go negative: popping past the root is an
                // escape attempt, not a normalizable path.
                if segments.pop().is_none() {
                    return Err(BrowseError::PathTraversal(raw.to_string()));
                }
            }
            other => segments.push(other),
        }
    }

    Ok(segments.join("/"))
}
