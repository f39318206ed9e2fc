//! In-process vector store
//!
//! Brute-force scoring over a `HashMap`; same contract as the Qdrant
//! backend, used for tests and offline runs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::config::{CollectionConfig, Distance};
use super::error::VectorError;
use super::store::{ScoredPoint, VectorBackend, VectorPoint, VectorResult};

/// Internal storage for vectors
#[derive(Debug, Clone)]
struct StoredVector {
    vector: Vec<f32>,
    payload: Map<String, Value>,
}

#[derive(Debug)]
struct MemoryCollection {
    config: CollectionConfig,
    points: HashMap<Uuid, StoredVector>,
}

/// Vector store held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<String, MemoryCollection>>>,
}

impl MemoryStore {
    /// Create an empty store with no collections
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of points in a collection
    pub async fn count(&self, collection: &str) -> VectorResult<usize> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|c| c.points.len())
            .ok_or_else(|| VectorError::CollectionNotFound {
                name: collection.to_string(),
            })
    }
}

#[async_trait]
impl VectorBackend for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let collections = self.collections.read().await;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn ensure_collection(&self, config: &CollectionConfig) -> VectorResult<bool> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&config.name) {
            return Ok(false);
        }
        if config.vector_size == 0 {
            return Err(VectorError::CollectionCreationFailed {
                reason: "vector size must be positive".to_string(),
            });
        }

        collections.insert(
            config.name.clone(),
            MemoryCollection {
                config: config.clone(),
                points: HashMap::new(),
            },
        );
        debug!(
            "Created in-memory collection '{}' with vector size {}",
            config.name, config.vector_size
        );
        Ok(true)
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>) -> VectorResult<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| VectorError::CollectionNotFound {
                name: collection.to_string(),
            })?;

        // Validate all vectors first so a batch is all-or-nothing
        for point in &points {
            validate_dimension(&target.config, &point.vector)?;
        }

        let written = points.len();
        for point in points {
            target.points.insert(
                point.id,
                StoredVector {
                    vector: point.vector,
                    payload: point.payload,
                },
            );
        }

        debug!("Upserted {} points into '{}'", written, collection);
        Ok(written)
    }

    async fn search(
        &self,
        collection: &str,
        query: &[f32],
        limit: usize,
    ) -> VectorResult<Vec<ScoredPoint>> {
        let collections = self.collections.read().await;
        let target = collections
            .get(collection)
            .ok_or_else(|| VectorError::CollectionNotFound {
                name: collection.to_string(),
            })?;
        validate_dimension(&target.config, query)?;

        let mut scored: Vec<(Uuid, f32, &StoredVector)> = target
            .points
            .iter()
            .map(|(id, stored)| {
                let score = similarity(target.config.distance, query, &stored.vector);
                (*id, score, stored)
            })
            .collect();

        // Sort by score descending; ties broken by id for stable output
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        let results: Vec<ScoredPoint> = scored
            .into_iter()
            .take(limit)
            .map(|(id, score, stored)| ScoredPoint {
                id: Some(id.to_string()),
                score,
                payload: stored.payload.clone(),
            })
            .collect();

        debug!(
            "Search returned {} results (limit: {})",
            results.len(),
            limit
        );

        Ok(results)
    }
}

fn validate_dimension(config: &CollectionConfig, vector: &[f32]) -> VectorResult<()> {
    let expected = config.vector_size as usize;
    let actual = vector.len();

    if actual != expected {
        return Err(VectorError::InvalidDimension {
            expected: expected as u64,
            actual: actual as u64,
        });
    }

    Ok(())
}

/// Score two vectors so that higher always means closer
pub(crate) fn similarity(distance: Distance, a: &[f32], b: &[f32]) -> f32 {
    match distance {
        Distance::Cosine => cosine_similarity(a, b),
        Distance::Euclidean => euclidean_similarity(a, b),
        Distance::Dot => dot_product(a, b),
    }
}

/// Cosine similarity in [-1, 1]; 0 when either vector has zero norm
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot = dot_product(a, b);
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// 1 / (1 + L2 distance), in (0, 1]
fn euclidean_similarity(a: &[f32], b: &[f32]) -> f32 {
    let distance: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f32>()
        .sqrt();

    1.0 / (1.0 + distance)
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
