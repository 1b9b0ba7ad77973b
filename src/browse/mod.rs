//! Browsing core
//!
//! Path validation, query parsing, directory listing, preview selection,
//! download streaming, and the request orchestrator that sequences them.

pub mod download;
pub mod handler;
pub mod listing;
pub mod path;
pub mod preview;
pub mod query;

pub use handler::Endpoint;
pub use listing::FileEntry;
pub use query::{SearchParams, SortField, SortParams};
