//! Text-to-image search over a vector collection

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{SearchError, SearchResult};
use crate::core::types::ImageHit;
use crate::embeddings::TextEncoder;
use crate::vector::{CollectionConfig, VectorBackend};

/// Result limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Limit used when the caller passes 0
    pub default_limit: usize,
    /// Upper bound for any request
    pub max_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            max_limit: 50,
        }
    }
}

impl SearchConfig {
    /// Effective limit for a request: 0 means default, capped at `max_limit`
    pub fn clamp_limit(&self, requested: usize) -> usize {
        let limit = if requested == 0 {
            self.default_limit
        } else {
            requested
        };
        limit.clamp(1, self.max_limit.max(1))
    }
}

/// Collections seen while verifying the configured one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionStatus {
    /// The configured collection, known to exist
    pub name: String,
    /// Every collection visible to the client
    pub available: Vec<String>,
}

/// Embeds queries and looks up the nearest stored images
pub struct SearchService {
    encoder: Arc<dyn TextEncoder>,
    backend: Arc<dyn VectorBackend>,
    collection: CollectionConfig,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        encoder: Arc<dyn TextEncoder>,
        backend: Arc<dyn VectorBackend>,
        collection: CollectionConfig,
        config: SearchConfig,
    ) -> Self {
        Self {
            encoder,
            backend,
            collection,
            config,
        }
    }

    /// Collection this service queries
    pub fn collection(&self) -> &CollectionConfig {
        &self.collection
    }

    /// Limit settings
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Names of all collections in the backend
    pub async fn list_collections(&self) -> SearchResult<Vec<String>> {
        Ok(self.backend.list_collections().await?)
    }

    /// Confirm the configured collection exists
    pub async fn verify_collection(&self) -> SearchResult<CollectionStatus> {
        let available = self.list_collections().await?;
        info!("Available collections: {:?}", available);

        if !available.iter().any(|c| c == &self.collection.name) {
            return Err(SearchError::CollectionMissing {
                name: self.collection.name.clone(),
                available,
            });
        }

        Ok(CollectionStatus {
            name: self.collection.name.clone(),
            available,
        })
    }

    /// Images closest to `query`, best first.
    ///
    /// A blank query returns no hits without calling the encoder or the
    /// backend. `limit` is clamped with [`SearchConfig::clamp_limit`].
    pub async fn search_images(&self, query: &str, limit: usize) -> SearchResult<Vec<ImageHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let limit = self.config.clamp_limit(limit);

        let embedding = self.encoder.embed_text(query).await?;
        let actual = embedding.len() as u64;
        if actual != self.collection.vector_size {
            return Err(SearchError::DimensionMismatch {
                expected: self.collection.vector_size,
                actual,
            });
        }

        let points = self
            .backend
            .search(&self.collection.name, &embedding, limit)
            .await?;

        let hits: Vec<ImageHit> = points
            .into_iter()
            .filter_map(|point| match point.path() {
                Some(path) => Some(ImageHit {
                    id: point.id.clone(),
                    score: point.score,
                    path: path.to_string(),
                }),
                None => {
                    warn!("Dropping hit {:?} without a path payload", point.id);
                    None
                }
            })
            .collect();

        debug!(
            query_len = query.chars().count(),
            limit,
            hits = hits.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );

        Ok(hits)
    }
}
