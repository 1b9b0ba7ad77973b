//! HTTP server
//!
//! Builds the axum router from configuration and runs the listener.

pub mod core;

pub use core::Server;
