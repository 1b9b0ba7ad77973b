//! File download
//!
//! Streams a single file as the response body. Content-type inference,
//! conditional requests, and byte ranges are delegated to
//! `tower_http::services::ServeFile` so partial downloads behave the way
//! clients expect.

use axum::body::Body;
use axum::extract::Request;
use axum::response::Response;
use log::info;
use std::path::Path;
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Stream the file at `path` in response to `request`.
///
/// The caller has already established that the path names a regular file
/// inside the browsing root.
pub async fn send_file(path: &Path, request: Request) -> Response {
    info!("Sending file {}", path.display());

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(infallible) => match infallible {},
    }
}
