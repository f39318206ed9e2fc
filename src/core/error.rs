//! Error types for multimodal search
//!
//! Each subsystem owns its error enum; `AppError` unifies them for the
//! binary and for the UI, which only needs a user-facing message.

use thiserror::Error;

use crate::config::ConfigError;
use crate::embeddings::EmbeddingError;
use crate::indexer::IndexerError;
use crate::logging::LoggingError;
use crate::search::SearchError;
use crate::vector::VectorError;
use crate::web::WebError;

/// Result type alias for application-level operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector store error: {0}")]
    Vector(#[from] VectorError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Indexer error: {0}")]
    Indexer(#[from] IndexerError),

    #[error("Web server error: {0}")]
    Web(#[from] WebError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Human-readable message for the UI and the command line
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(ConfigError::MissingCredentials { .. }) => {
                "Missing Qdrant credentials. Please check your .env file.".to_string()
            }
            AppError::Config(e) => format!("Invalid configuration: {}", e),
            AppError::Vector(VectorError::ConnectionFailed { url, reason }) => format!(
                "Failed to connect to Qdrant: {}\nURL: {}\nPlease verify your Qdrant URL and API key are correct.",
                reason, url
            ),
            AppError::Embedding(e) => format!(
                "Failed to initialize models: {}\nPlease try again later or contact support if the issue persists.",
                e
            ),
            AppError::Search(e) => e.user_message(),
            AppError::Vector(e) => format!("Vector database error: {}", e),
            other => other.to_string(),
        }
    }
}
