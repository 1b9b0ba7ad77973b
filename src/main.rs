//! webindex - Entry Point
//!
//! A self-hosted file browser over HTTP: directory listings with search and
//! sort, single-file downloads, and in-place extraction of uploaded archives.

use log::{error, info};

use webindex::Server;
use webindex::config::ServerConfig;

#[tokio::main]
async fn main() {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    info!("Launching webindex server...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server = Server::new(config);
    if let Err(e) = server.start().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
