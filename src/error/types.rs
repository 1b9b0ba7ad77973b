//! Error types
//!
//! Defines the request-level error kinds for the file browser.

use std::fmt;
use std::io;

/// Errors raised while handling a browse, download, or upload request.
///
/// ACL denials and path-guard failures are both surfaced as `NotFound` at the
/// HTTP boundary so a denied client cannot distinguish a forbidden entry from
/// a missing one.
#[derive(Debug)]
pub enum BrowseError {
    PathTraversal(String),
    NotFound(String),
    Unauthorized(String),
    InvalidQuery(String),
    UnsupportedArchiveKind(String),
    CorruptArchive(String),
    Io(io::Error),
}

impl fmt::Display for BrowseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrowseError::PathTraversal(p) => write!(f, "Path traversal attempt: {}", p),
            BrowseError::NotFound(p) => write!(f, "Not found: {}", p),
            BrowseError::Unauthorized(r) => write!(f, "Unauthorized access to {}", r),
            BrowseError::InvalidQuery(q) => write!(f, "Invalid search query: {}", q),
            BrowseError::UnsupportedArchiveKind(k) => {
                write!(f, "Unsupported archive kind: {}", k)
            }
            BrowseError::CorruptArchive(m) => write!(f, "Corrupt archive: {}", m),
            BrowseError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for BrowseError {}

impl From<io::Error> for BrowseError {
    fn from(error: io::Error) -> Self {
        BrowseError::Io(error)
    }
}
