//! Error responses
//!
//! Maps request errors onto HTTP responses and logs them.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use log::{error, warn};

use crate::error::types::BrowseError;

/// Convert an error into the response the client is allowed to see.
///
/// Path-guard and ACL failures collapse into a plain 404 so that denied and
/// missing resources are indistinguishable. Archive and I/O failures are
/// logged server-side and answered with a generic status.
pub fn error_response(err: BrowseError) -> Response {
    match err {
        BrowseError::PathTraversal(ref p) => {
            warn!("Rejected path traversal attempt: {}", p);
            (StatusCode::NOT_FOUND, "404 Not Found").into_response()
        }
        BrowseError::NotFound(_) => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
        BrowseError::Unauthorized(resource) => {
            let challenge = format!(
                "Basic realm=\"Authentication required to use {}\"",
                resource
            );
            (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, challenge)],
                "401 Unauthorized",
            )
                .into_response()
        }
        BrowseError::InvalidQuery(q) => {
            (StatusCode::BAD_REQUEST, format!("Invalid search query: {}", q)).into_response()
        }
        BrowseError::UnsupportedArchiveKind(k) => (
            StatusCode::BAD_REQUEST,
            format!("Unsupported archive kind: {}", k),
        )
            .into_response(),
        BrowseError::CorruptArchive(ref m) => {
            warn!("Upload failed on corrupt archive: {}", m);
            (StatusCode::BAD_REQUEST, "400 Corrupt Archive").into_response()
        }
        BrowseError::Io(ref e) => {
            error!("Request failed with I/O error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error").into_response()
        }
    }
}

impl IntoResponse for BrowseError {
    fn into_response(self) -> Response {
        error_response(self)
    }
}
