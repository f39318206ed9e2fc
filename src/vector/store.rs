//! Backend-neutral vector store types
//!
//! Search and indexing talk to a [`VectorBackend`]; the hosted Qdrant
//! service and the in-process [`MemoryStore`](super::MemoryStore) both
//! implement it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::config::CollectionConfig;
use super::error::VectorError;
use super::payload_fields;

/// Result type for vector operations
pub type VectorResult<T> = Result<T, VectorError>;

/// A point in the vector space with associated payload
#[derive(Debug, Clone)]
pub struct VectorPoint {
    /// Unique point ID
    pub id: Uuid,
    /// Vector embedding
    pub vector: Vec<f32>,
    /// Payload data stored next to the vector
    pub payload: Map<String, Value>,
}

impl VectorPoint {
    /// Create a new vector point
    pub fn new(id: Uuid, vector: Vec<f32>) -> Self {
        Self {
            id,
            vector,
            payload: Map::new(),
        }
    }

    /// Add a payload field
    pub fn with_payload(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Add the image path to payload
    pub fn with_path(self, path: &str) -> Self {
        self.with_payload(payload_fields::PATH, Value::String(path.to_string()))
    }

    /// Add the bare file name to payload
    pub fn with_file_name(self, name: &str) -> Self {
        self.with_payload(payload_fields::FILE_NAME, Value::String(name.to_string()))
    }

    /// Add indexing timestamp (RFC 3339) to payload
    pub fn with_indexed_at(self, at: DateTime<Utc>) -> Self {
        self.with_payload(payload_fields::INDEXED_AT, Value::String(at.to_rfc3339()))
    }
}

/// Search result from vector query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPoint {
    /// Point ID, rendered as a string (UUID or integer)
    pub id: Option<String>,
    /// Similarity score as computed by the backend
    pub score: f32,
    /// Payload data
    pub payload: Map<String, Value>,
}

impl ScoredPoint {
    /// Extract the image path from payload
    pub fn path(&self) -> Option<&str> {
        self.payload
            .get(payload_fields::PATH)
            .and_then(|v| v.as_str())
    }
}

/// Storage backend for image vectors
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Names of all collections visible to this client
    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    /// Check whether a collection exists
    async fn collection_exists(&self, name: &str) -> VectorResult<bool> {
        let collections = self.list_collections().await?;
        Ok(collections.iter().any(|c| c == name))
    }

    /// Create the collection if missing; returns true when it was created
    async fn ensure_collection(&self, config: &CollectionConfig) -> VectorResult<bool>;

    /// Insert or replace points, returning how many were written
    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> VectorResult<usize>;

    /// Nearest neighbours of `query`, best first, at most `limit`
    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> VectorResult<Vec<ScoredPoint>>;
}
