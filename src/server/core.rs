use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::any;
use log::{error, info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::browse::Endpoint;
use crate::browse::handler::{browse_entry, browse_root};
use crate::config::ServerConfig;

pub struct Server {
    config: ServerConfig,
}

impl Server {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Build the router serving every configured endpoint.
    ///
    /// Exposed separately from [`start`](Self::start) so tests can drive the
    /// router without binding a socket.
    pub fn router(&self) -> Router {
        let mut app = Router::new();

        for endpoint_config in &self.config.endpoints {
            if let Err(e) = std::fs::create_dir_all(endpoint_config.root_path()) {
                warn!(
                    "Failed to create browsing root {}: {}",
                    endpoint_config.root, e
                );
            } else {
                info!(
                    "Serving {} from {}",
                    endpoint_config.route, endpoint_config.root
                );
            }

            let endpoint = Arc::new(Endpoint::new(endpoint_config.clone()));
            let routes = Router::new()
                .route("/", any(browse_root))
                .route("/*path", any(browse_entry))
                .with_state(endpoint);

            app = app.nest(&endpoint_config.route, routes);
        }

        app.layer(DefaultBodyLimit::max(self.config.max_upload_bytes()))
    }

    pub async fn start(self) -> Result<(), io::Error> {
        let socket = self.config.listen_socket();

        let listener = match TcpListener::bind(&socket).await {
            Ok(listener) => {
                info!("Server bound to {}", socket);
                listener
            }
            Err(e) => {
                error!("Failed to bind to {}: {}", socket, e);
                return Err(e);
            }
        };

        let app = self.router();

        info!(
            "Starting webindex server on {} ({} endpoints)",
            socket,
            self.config.endpoints.len()
        );

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
    }
}
