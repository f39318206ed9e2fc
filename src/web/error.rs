//! Web server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::search::SearchError;

/// Web server error type
#[derive(Error, Debug)]
pub enum WebError {
    #[error("Query must not be empty")]
    EmptyQuery,

    #[error("Missing query parameter '{name}'")]
    MissingParameter { name: &'static str },

    #[error("Path is outside the image root: {path}")]
    Forbidden { path: String },

    #[error("Image not found: {path}")]
    NotFound { path: String },

    #[error("{}", .0.user_message())]
    Search(#[from] SearchError),

    #[error("Server bind failed on {addr}: {reason}")]
    BindFailed { addr: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {reason}")]
    Internal { reason: String },
}

impl WebError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebError::EmptyQuery | WebError::MissingParameter { .. } => StatusCode::BAD_REQUEST,
            WebError::Forbidden { .. } => StatusCode::FORBIDDEN,
            WebError::NotFound { .. } => StatusCode::NOT_FOUND,
            WebError::Search(_) => StatusCode::BAD_GATEWAY,
            WebError::BindFailed { .. } | WebError::Io(_) | WebError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
