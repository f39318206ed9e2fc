//! Error types for the indexer module

use std::path::PathBuf;
use thiserror::Error;

use super::SkippedImage;
use crate::embeddings::EmbeddingError;
use crate::vector::VectorError;

/// Errors that can occur during indexing operations
#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("Not a directory: {path}")]
    InvalidRoot { path: PathBuf },

    #[error("Invalid search pattern: {reason}")]
    Pattern { reason: String },

    /// One image could not be read or decoded; the run skips it
    #[error("Cannot index {path}: {reason}")]
    Image { path: PathBuf, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector storage failed: {0}")]
    Vector(#[from] VectorError),

    #[error("Image embedding has dimension {actual}, collection expects {expected}")]
    DimensionMismatch { expected: u64, actual: u64 },
}

/// Result type for indexer operations
pub type IndexerResult<T> = Result<T, IndexerError>;

impl IndexerError {
    /// The skip record for a per-image failure; any other error is handed back
    pub fn into_skipped(self) -> Result<SkippedImage, IndexerError> {
        match self {
            IndexerError::Image { path, reason } => Ok(SkippedImage { path, reason }),
            other => Err(other),
        }
    }
}
