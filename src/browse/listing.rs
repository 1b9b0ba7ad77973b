//! Directory listing
//!
//! Enumerates one directory level, applies the search filter, and orders the
//! result. Read-only: every listing is computed fresh from the filesystem.

use log::info;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::browse::query::{SearchParams, SortField, SortParams};
use crate::error::BrowseError;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub is_directory: bool,
    pub size: u64,
    /// Modification time as unix seconds; 0 when metadata is unavailable.
    pub modified_at: u64,
}

/// List the directory at `real_path`, filtered and ordered per the request.
///
/// Fails with `NotFound` when the path does not resolve to a directory and
/// with `InvalidQuery` when a regex search pattern does not compile — an
/// unfiltered listing must never masquerade as a filtered one.
pub fn list_directory(
    real_path: &Path,
    virtual_path: &str,
    search: &SearchParams,
    sort: &SortParams,
) -> Result<Vec<FileEntry>, BrowseError> {
    if !real_path.is_dir() {
        return Err(BrowseError::NotFound(virtual_path.to_string()));
    }

    let matcher = Matcher::build(search)?;

    let mut entries = Vec::new();
    for entry in fs::read_dir(real_path).map_err(BrowseError::Io)? {
        let entry = entry.map_err(BrowseError::Io)?;
        let name = entry.file_name().to_string_lossy().to_string();

        if !matcher.matches(&name) {
            continue;
        }

        // Metadata failures degrade to zeroed size/timestamp rather than
        // dropping the entry from the listing.
        match entry.metadata() {
            Ok(metadata) => {
                let size = if metadata.is_dir() { 0 } else { metadata.len() };
                let modified_at = metadata
                    .modified()
                    .ok()
                    .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
                    .map(|dur| dur.as_secs())
                    .unwrap_or(0);

                entries.push(FileEntry {
                    name,
                    is_directory: metadata.is_dir(),
                    size,
                    modified_at,
                });
            }
            Err(_) => entries.push(FileEntry {
                name,
                is_directory: false,
                size: 0,
                modified_at: 0,
            }),
        }
    }

    sort_entries(&mut entries, sort);

    info!(
        "Listed directory {} - {} entries",
        virtual_path,
        entries.len()
    );

    Ok(entries)
}

/// Stable sort by the requested field. Directories and files are not
/// segregated; the sort key applies uniformly across both kinds.
fn sort_entries(entries: &mut [FileEntry], sort: &SortParams) {
    entries.sort_by(|a, b| {
        let ordering = match sort.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Size => a.size.cmp(&b.size),
            SortField::Date => a.modified_at.cmp(&b.modified_at),
        };
        if sort.descending {
            ordering.reverse()
        } else {
            ordering
        }
    });
}

/// Compiled form of the search filter.
enum Matcher {
    All,
    Substring { needle: String, match_case: bool },
    Pattern(regex::Regex),
}

impl Matcher {
    fn build(search: &SearchParams) -> Result<Self, BrowseError> {
        if !search.is_active() {
            return Ok(Matcher::All);
        }

        if search.use_regex {
            let pattern = regex::RegexBuilder::new(&search.query)
                .case_insensitive(!search.match_case)
                .build()
                .map_err(|_| BrowseError::InvalidQuery(search.query.clone()))?;
            return Ok(Matcher::Pattern(pattern));
        }

        Ok(Matcher::Substring {
            needle: if search.match_case {
                search.query.clone()
            } else {
                search.query.to_lowercase()
            },
            match_case: search.match_case,
        })
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::All => true,
            Matcher::Substring { needle, match_case } => {
                if *match_case {
                    name.contains(needle.as_str())
                } else {
                    name.to_lowercase().contains(needle.as_str())
                }
            }
            Matcher::Pattern(pattern) => pattern.is_match(name),
        }
    }
}
