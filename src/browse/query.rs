//! Query parsing
//!
//! Converts raw request query parameters into typed search and sort
//! parameters. Field selection and sort direction are decoupled: the field
//! comes from a four-character prefix of the `sort` value, the direction
//! from a trailing `desc` suffix, so `sort=size-desc` selects both.

use serde::Serialize;

/// Search filter parameters for a listing request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchParams {
    pub query: String,
    pub match_case: bool,
    pub use_regex: bool,
}

impl SearchParams {
    /// True when a search query is active for this request.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }
}

/// Field a directory listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Name,
    Size,
    Date,
}

/// Sort order parameters for a listing request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SortParams {
    pub field: SortField,
    pub descending: bool,
}

impl Default for SortParams {
    fn default() -> Self {
        Self {
            field: SortField::Name,
            descending: false,
        }
    }
}

/// Parse search and sort parameters from decoded query pairs.
///
/// `matchcase=on` and `regex=on` are the only truthy spellings; every other
/// value, including absence, is false.
pub fn parse_params(pairs: &[(String, String)]) -> (SearchParams, SortParams) {
    let search = SearchParams {
        query: first_value(pairs, "query").unwrap_or_default().to_string(),
        match_case: first_value(pairs, "matchcase") == Some("on"),
        use_regex: first_value(pairs, "regex") == Some("on"),
    };

    let sort = match first_value(pairs, "sort") {
        None => SortParams::default(),
        Some(raw) => {
            let field = match raw.get(..4) {
                Some("size") => SortField::Size,
                Some("date") => SortField::Date,
                _ => SortField::Name,
            };
            SortParams {
                field,
                descending: raw.ends_with("desc"),
            }
        }
    };

    (search, sort)
}

fn first_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
