//! Search error types

use thiserror::Error;

use crate::embeddings::EmbeddingError;
use crate::vector::VectorError;

/// Generic message shown when a query cannot be answered
pub const SEARCH_FAILED_MESSAGE: &str = "Search failed. Please try again.";

/// Errors raised while answering a query
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Query embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector search failed: {0}")]
    Vector(#[from] VectorError),

    #[error("Collection '{name}' not found")]
    CollectionMissing { name: String, available: Vec<String> },

    #[error("Query embedding has dimension {actual}, collection expects {expected}")]
    DimensionMismatch { expected: u64, actual: u64 },
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

impl SearchError {
    /// Message suitable for the page and the terminal
    pub fn user_message(&self) -> String {
        match self {
            SearchError::CollectionMissing { name, available } => {
                let quoted: Vec<String> = available.iter().map(|c| format!("'{}'", c)).collect();
                format!(
                    "Collection '{}' not found. Available collections are: [{}]",
                    name,
                    quoted.join(", ")
                )
            }
            _ => SEARCH_FAILED_MESSAGE.to_string(),
        }
    }
}
