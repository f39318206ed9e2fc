//! Image Indexer
//!
//! Walks a directory for images, embeds each one with the CLIP vision
//! tower and upserts the vectors in batches. Point ids derive from the
//! path, so re-running over the same tree overwrites instead of
//! duplicating.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use glob::MatchOptions;
use serde::{Deserialize, Serialize};

pub mod error;
#[cfg(test)]
mod tests;

pub use error::{IndexerError, IndexerResult};

use crate::core::utils::{get_filename, point_id_for_path};
use crate::embeddings::ImageEncoder;
use crate::vector::{CollectionConfig, VectorBackend, VectorPoint};

/// Indexer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Points per upsert request
    pub batch_size: usize,
    /// File extensions to pick up, matched case-insensitively
    pub extensions: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            extensions: ["jpg", "jpeg", "png", "webp", "bmp", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// An image the run could not index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one indexing run
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexReport {
    /// Images found under the root
    pub discovered: usize,
    /// Images written to the collection
    pub indexed: usize,
    /// Images skipped, with the reason
    pub skipped: Vec<SkippedImage>,
    /// Whether the run had to create the collection
    pub collection_created: bool,
}

/// Embeds images from disk into the vector collection
pub struct ImageIndexer {
    encoder: Arc<dyn ImageEncoder>,
    backend: Arc<dyn VectorBackend>,
    collection: CollectionConfig,
    config: IndexerConfig,
}

impl ImageIndexer {
    pub fn new(
        encoder: Arc<dyn ImageEncoder>,
        backend: Arc<dyn VectorBackend>,
        collection: CollectionConfig,
        config: IndexerConfig,
    ) -> Self {
        Self {
            encoder,
            backend,
            collection,
            config,
        }
    }

    /// Every image file under `root`, sorted, without duplicates
    pub fn discover(&self, root: &Path) -> IndexerResult<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(IndexerError::InvalidRoot {
                path: root.to_path_buf(),
            });
        }

        let options = MatchOptions {
            case_sensitive: false,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        };
        let root_str = root.to_string_lossy();
        let base = glob::Pattern::escape(root_str.trim_end_matches('/'));

        let mut found = Vec::new();
        for ext in &self.config.extensions {
            let pattern = format!("{}/**/*.{}", base, ext.trim_start_matches('.'));
            let entries = glob::glob_with(&pattern, options)
                .map_err(|e| IndexerError::Pattern { reason: e.to_string() })?;

            for entry in entries {
                match entry {
                    Ok(path) if path.is_file() => found.push(path),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Skipping unreadable path: {}", e),
                }
            }
        }

        found.sort();
        found.dedup();
        Ok(found)
    }

    /// Index every image under `root`
    pub async fn run(&self, root: &Path) -> IndexerResult<IndexReport> {
        let started = Instant::now();
        let images = self.discover(root)?;
        tracing::info!("Found {} images under {}", images.len(), root.display());

        let collection_created = self.backend.ensure_collection(&self.collection).await?;
        if collection_created {
            tracing::info!("Created collection '{}'", self.collection.name);
        }

        let mut report = IndexReport {
            discovered: images.len(),
            collection_created,
            ..IndexReport::default()
        };

        let batch_size = self.config.batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size);

        for path in &images {
            match self.embed_one(path).await {
                Ok(point) => batch.push(point),
                Err(e) => {
                    let skipped = e.into_skipped()?;
                    tracing::warn!("Skipping {}: {}", skipped.path.display(), skipped.reason);
                    report.skipped.push(skipped);
                }
            }

            if batch.len() >= batch_size {
                report.indexed += self.flush(&mut batch).await?;
                tracing::info!("Indexed {}/{} images", report.indexed, report.discovered);
            }
        }
        report.indexed += self.flush(&mut batch).await?;

        tracing::info!(
            indexed = report.indexed,
            skipped = report.skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Indexing finished"
        );
        Ok(report)
    }

    async fn embed_one(&self, path: &Path) -> IndexerResult<VectorPoint> {
        let vector = match self.encoder.embed_image_file(path).await {
            Ok(vector) => vector,
            Err(e) if e.is_input_error() => {
                return Err(IndexerError::Image {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let actual = vector.len() as u64;
        if actual != self.collection.vector_size {
            return Err(IndexerError::DimensionMismatch {
                expected: self.collection.vector_size,
                actual,
            });
        }

        let path_str = path.to_string_lossy().to_string();
        Ok(VectorPoint::new(point_id_for_path(&path_str), vector)
            .with_path(&path_str)
            .with_file_name(&get_filename(path))
            .with_indexed_at(Utc::now()))
    }

    async fn flush(&self, batch: &mut Vec<VectorPoint>) -> IndexerResult<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let points = std::mem::take(batch);
        Ok(self.backend.upsert(&self.collection.name, points).await?)
    }
}
