//! Vector store error types

use thiserror::Error;

/// Vector store specific errors
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Failed to connect to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Failed to list collections: {reason}")]
    ListFailed { reason: String },

    #[error("Collection not found: {name}")]
    CollectionNotFound { name: String },

    #[error("Failed to create collection: {reason}")]
    CollectionCreationFailed { reason: String },

    #[error("Failed to upsert vectors: {reason}")]
    UpsertFailed { reason: String },

    #[error("Failed to search vectors: {reason}")]
    SearchFailed { reason: String },

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: u64, actual: u64 },
}
