//! Error handling
//!
//! Defines error types and response mapping for the file browser.

pub mod handlers;
pub mod types;

pub use types::*;
