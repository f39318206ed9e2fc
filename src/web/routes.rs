//! HTTP handlers and middleware
//!
//! The HTML page and the JSON API share one [`AppState`]; image files are
//! streamed from disk after confining the requested path to the image root.

use std::path::{Path, PathBuf};

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use super::error::WebError;
use super::page::{image_url, render_page, PageBody, PageView};
use super::server::AppState;
use crate::core::utils::{image_content_type, truncate_string};

/// Query string for the HTML page
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub q: Option<String>,
}

/// Query string for `/api/search`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// Query string for `/image`
#[derive(Debug, Default, Deserialize)]
pub struct ImageParams {
    pub path: Option<String>,
}

/// One hit in the JSON API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHitDto {
    pub id: Option<String>,
    pub score: f32,
    pub path: String,
    pub image_url: String,
}

/// `/api/search` response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub limit: usize,
    pub results: Vec<SearchHitDto>,
}

/// Adds security response headers to every response
pub async fn security_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

/// Route: GET /
pub async fn index(State(state): State<AppState>, Query(params): Query<PageParams>) -> Html<String> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();

    let collections = match state.search.list_collections().await {
        Ok(collections) => collections,
        Err(e) => {
            tracing::warn!("Could not list collections: {}", e);
            Vec::new()
        }
    };

    let body = if query.is_empty() {
        PageBody::Empty
    } else {
        match state.search.search_images(query, 0).await {
            Ok(hits) => PageBody::Results(hits),
            Err(e) => {
                tracing::error!("Search failed for '{}': {}", truncate_string(query, 80), e);
                PageBody::Failed(e.to_string())
            }
        }
    };

    Html(render_page(&PageView {
        title: &state.config.title,
        query,
        columns: state.config.columns,
        collections: &collections,
        body,
    }))
}

/// Route: GET /api/search
pub async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, WebError> {
    let query = params.q.unwrap_or_default().trim().to_string();
    if query.is_empty() {
        return Err(WebError::EmptyQuery);
    }

    let limit = state
        .search
        .config()
        .clamp_limit(params.limit.unwrap_or(0));
    let hits = state.search.search_images(&query, limit).await?;

    let results = hits
        .into_iter()
        .map(|hit| SearchHitDto {
            image_url: image_url(&hit.path),
            id: hit.id,
            score: hit.score,
            path: hit.path,
        })
        .collect();

    Ok(Json(SearchResponse {
        query,
        limit,
        results,
    }))
}

/// Route: GET /api/collections
pub async fn api_collections(State(state): State<AppState>) -> Result<Json<Vec<String>>, WebError> {
    Ok(Json(state.search.list_collections().await?))
}

/// Route: GET /image?path=
pub async fn serve_image(
    State(state): State<AppState>,
    Query(params): Query<ImageParams>,
) -> Result<Response, WebError> {
    let requested = params
        .path
        .filter(|p| !p.is_empty())
        .ok_or(WebError::MissingParameter { name: "path" })?;

    let path = resolve_image_path(&state.config.image_root, &requested).await?;
    let file = tokio::fs::File::open(&path).await?;
    let length = file.metadata().await?.len();

    let headers = [
        (header::CONTENT_TYPE, image_content_type(&path).to_string()),
        (header::CONTENT_LENGTH, length.to_string()),
        (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
    ];
    let body = Body::from_stream(ReaderStream::new(file));

    Ok((headers, body).into_response())
}

/// Canonical path of `requested`, which must be a file inside `root`
pub async fn resolve_image_path(root: &Path, requested: &str) -> Result<PathBuf, WebError> {
    let root = tokio::fs::canonicalize(root).await.map_err(|e| WebError::Internal {
        reason: format!("image root {} is unusable: {}", root.display(), e),
    })?;

    let candidate = Path::new(requested);
    let candidate = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    let resolved = match tokio::fs::canonicalize(&candidate).await {
        Ok(path) => path,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WebError::NotFound {
                path: requested.to_string(),
            })
        }
        Err(e) => return Err(WebError::Io(e)),
    };

    if !resolved.starts_with(&root) {
        tracing::warn!("Blocked image request outside root: {}", requested);
        return Err(WebError::Forbidden {
            path: requested.to_string(),
        });
    }
    if !resolved.is_file() {
        return Err(WebError::NotFound {
            path: requested.to_string(),
        });
    }

    Ok(resolved)
}

/// Route: GET /health
pub async fn health() -> &'static str {
    "OK"
}
