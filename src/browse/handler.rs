//! Request orchestration
//!
//! Sequences one browse request through its gates: ACL, path guard,
//! authentication, then exactly one of archive ingestion, file download,
//! or directory listing.

use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{ConnectInfo, FromRequest, Multipart, OriginalUri, Query, Request, State};
use axum::extract::Path as UrlPath;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Response};
use log::info;
use serde::Serialize;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::task;

use crate::archive::{self, ArchiveKind, UploadOutcome};
use crate::browse::listing::FileEntry;
use crate::browse::query::{SearchParams, SortParams};
use crate::browse::{download, listing, path, preview, query};
use crate::config::{EndpointConfig, PreviewMode};
use crate::error::BrowseError;
use crate::{acl, auth};

/// One configured endpoint's read-only request state.
pub struct Endpoint {
    pub config: EndpointConfig,
    pub root: PathBuf,
}

impl Endpoint {
    pub fn new(config: EndpointConfig) -> Self {
        let root = config.root_path();
        Self { config, root }
    }

    fn resolve(&self, relative: &str) -> PathBuf {
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }
}

/// A query parameter echoed back for stateful navigation links.
#[derive(Debug, Serialize)]
struct PreservedParam {
    key: String,
    value: String,
}

/// The assembled directory listing response.
#[derive(Serialize)]
struct ListingPage {
    url: String,
    allow_upload: bool,
    search: SearchParams,
    sort: SortParams,
    preserved_params: Vec<PreservedParam>,
    preview: Option<String>,
    entries: Vec<FileEntry>,
}

/// Handler for requests addressing the endpoint root.
pub async fn browse_root(
    State(endpoint): State<Arc<Endpoint>>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    OriginalUri(uri): OriginalUri,
    request: Request,
) -> Response {
    match run_request(endpoint, client, uri, String::new(), request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Handler for requests addressing an entry below the endpoint root.
pub async fn browse_entry(
    State(endpoint): State<Arc<Endpoint>>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    OriginalUri(uri): OriginalUri,
    UrlPath(rest): UrlPath<String>,
    request: Request,
) -> Response {
    match run_request(endpoint, client, uri, rest, request).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

async fn run_request(
    endpoint: Arc<Endpoint>,
    client: SocketAddr,
    uri: Uri,
    raw_path: String,
    request: Request,
) -> Result<Response, BrowseError> {
    let method = request.method().clone();

    // ACL denial is deliberately indistinguishable from a missing entry.
    let upload_allowed = acl::is_allowed(client.ip(), &endpoint.config.upload);
    let allow_post = method == Method::POST && upload_allowed;
    let allow_view =
        method != Method::POST && acl::is_allowed(client.ip(), &endpoint.config.view);
    if !allow_post && !allow_view {
        return Err(BrowseError::NotFound(uri.path().to_string()));
    }

    let relative = path::normalize_request_path(&raw_path)?;

    let pairs = query_pairs(&uri)?;
    let (search, sort) = query::parse_params(&pairs);

    if !auth::authenticate(request.headers(), endpoint.config.auth.as_ref()) {
        return Err(BrowseError::Unauthorized(resource_name(&uri, &endpoint)));
    }

    if allow_post {
        // Uploads target the directory currently browsed; an active search
        // filters the view and suspends uploads with it.
        if search.is_active() {
            return Err(BrowseError::NotFound(uri.path().to_string()));
        }
        return receive_upload(&endpoint, &relative, request).await;
    }

    let real = endpoint.resolve(&relative);
    if real.is_file() {
        return Ok(download::send_file(&real, request).await);
    }

    let entries = listing::list_directory(&real, uri.path(), &search, &sort)?;

    let mut rendered_preview = None;
    if !search.is_active() && endpoint.config.preview != PreviewMode::None {
        if let Some(notable) = preview::notable_file(&entries) {
            rendered_preview =
                preview::render_file(endpoint.config.preview, &real.join(&notable.name));
        }
    }

    let page = ListingPage {
        url: uri.path().to_string(),
        allow_upload: upload_allowed && !search.is_active(),
        search,
        sort,
        preserved_params: preserved_params(&pairs),
        preview: rendered_preview,
        entries,
    };

    Ok(Json(page).into_response())
}

/// Ingest an uploaded multipart body: each part's field name declares its
/// archive kind, and each archive extracts fully before the next begins.
async fn receive_upload(
    endpoint: &Endpoint,
    relative: &str,
    request: Request,
) -> Result<Response, BrowseError> {
    let dest = endpoint.resolve(relative);
    if !dest.is_dir() {
        return Err(BrowseError::NotFound(relative.to_string()));
    }

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| BrowseError::CorruptArchive(e.to_string()))?;

    let mut outcome = UploadOutcome::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BrowseError::CorruptArchive(e.to_string()))?
    {
        let tag = field.name().unwrap_or_default().to_string();
        let kind = ArchiveKind::from_tag(&tag)
            .ok_or_else(|| BrowseError::UnsupportedArchiveKind(tag.clone()))?;
        let upload_name = field.file_name().map(str::to_string);
        let spool = spool_field(field).await?;

        let dest_dir = dest.clone();
        let part = task::spawn_blocking(move || {
            archive::extract(kind, spool, upload_name.as_deref(), &dest_dir)
        })
        .await
        .map_err(|e| BrowseError::Io(io::Error::new(io::ErrorKind::Other, e)))??;

        outcome.merge(part);
    }

    info!(
        "Upload into {} complete: {} files, {} bytes",
        dest.display(),
        outcome.files_written,
        outcome.bytes_written
    );

    Ok("ok".into_response())
}

/// Spool one multipart field to an unnamed temporary file so the blocking
/// decoders can seek and re-read it.
async fn spool_field(mut field: Field<'_>) -> Result<std::fs::File, BrowseError> {
    let spool = tempfile::tempfile().map_err(BrowseError::Io)?;
    let mut file = tokio::fs::File::from_std(spool);

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| BrowseError::CorruptArchive(e.to_string()))?
    {
        file.write_all(&chunk).await.map_err(BrowseError::Io)?;
    }

    file.flush().await.map_err(BrowseError::Io)?;
    file.rewind().await.map_err(BrowseError::Io)?;
    Ok(file.into_std().await)
}

fn query_pairs(uri: &Uri) -> Result<Vec<(String, String)>, BrowseError> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|_| BrowseError::InvalidQuery(uri.query().unwrap_or_default().to_string()))?;
    Ok(pairs)
}

/// First value per key, echoed back so navigation links can keep the
/// caller's search and sort state.
fn preserved_params(pairs: &[(String, String)]) -> Vec<PreservedParam> {
    let mut result: Vec<PreservedParam> = Vec::new();
    for (key, value) in pairs {
        if result.iter().any(|param| &param.key == key) {
            continue;
        }
        result.push(PreservedParam {
            key: key.clone(),
            value: value.clone(),
        });
    }
    result
}

/// The resource named in an authentication challenge: the last segment of
/// the request path, or the endpoint name at its root.
fn resource_name(uri: &Uri, endpoint: &Endpoint) -> String {
    uri.path()
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or(endpoint.config.display_name())
        .to_string()
}
