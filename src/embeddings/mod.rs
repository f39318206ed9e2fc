//! Embedding Engine for multimodal search
//!
//! This module provides CLIP ViT-B/32 embeddings in a shared text/image
//! space:
//! - Text embeddings from the CLIP text tower
//! - Image embeddings from the CLIP vision tower
//! - Lazy model loading, with model files fetched into a local cache
//!
//! Search and indexing depend on the [`TextEncoder`] and [`ImageEncoder`]
//! traits rather than on the engine itself.

mod config;
mod download;
mod error;
mod image_embedder;
mod model_manager;
mod text_embedder;

#[cfg(test)]
mod tests;

pub use config::{EmbeddingConfig, ImageEmbeddingConfig, ModelType, TextEmbeddingConfig};
pub use download::ModelDownloader;
pub use error::{EmbeddingError, EmbeddingResult};
pub use image_embedder::{ImageEmbedder, CLIP_MEAN, CLIP_STD};
pub use model_manager::{ModelManager, TextModelFiles};
pub use text_embedder::TextEmbedder;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::utils::l2_normalize;

/// Turns a text query into a vector
#[async_trait]
pub trait TextEncoder: Send + Sync {
    /// Embed one text; the result is L2-normalised
    async fn embed_text(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Output dimension
    fn dimension(&self) -> usize;
}

/// Turns an image into a vector in the same space as [`TextEncoder`]
#[async_trait]
pub trait ImageEncoder: Send + Sync {
    /// Embed encoded image bytes (any format `image` can decode)
    async fn embed_image_bytes(&self, data: Vec<u8>) -> EmbeddingResult<Vec<f32>>;

    /// Embed an image file
    async fn embed_image_file(&self, path: &Path) -> EmbeddingResult<Vec<f32>> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| EmbeddingError::ImageProcessingFailed {
                reason: format!("Failed to read {}: {}", path.display(), e),
            })?;
        self.embed_image_bytes(data).await
    }

    /// Output dimension
    fn dimension(&self) -> usize;
}

/// Main embedding engine that coordinates model loading and inference
pub struct EmbeddingEngine {
    /// Model file resolution and downloads
    model_manager: Arc<ModelManager>,

    /// Text embedder instance, created on first use
    text_embedder: RwLock<Option<Arc<TextEmbedder>>>,

    /// Image embedder instance, created on first use
    image_embedder: RwLock<Option<Arc<ImageEmbedder>>>,

    /// Configuration
    config: EmbeddingConfig,
}

impl EmbeddingEngine {
    /// Create a new embedding engine (models are loaded on first use)
    pub fn new(config: EmbeddingConfig) -> EmbeddingResult<Self> {
        let model_manager = Arc::new(ModelManager::new(config.clone())?);

        Ok(Self {
            model_manager,
            text_embedder: RwLock::new(None),
            image_embedder: RwLock::new(None),
            config,
        })
    }

    /// Engine configuration
    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    /// Model manager used by this engine
    pub fn model_manager(&self) -> &ModelManager {
        &self.model_manager
    }

    /// Load the text model now instead of on the first query
    pub async fn preload_text(&self) -> EmbeddingResult<()> {
        self.text().await.map(|_| ())
    }

    /// Load the vision model now instead of on the first image
    pub async fn preload_image(&self) -> EmbeddingResult<()> {
        self.image().await.map(|_| ())
    }

    async fn text(&self) -> EmbeddingResult<Arc<TextEmbedder>> {
        if let Some(embedder) = self.text_embedder.read().await.as_ref() {
            return Ok(embedder.clone());
        }

        let mut slot = self.text_embedder.write().await;
        if let Some(embedder) = slot.as_ref() {
            return Ok(embedder.clone());
        }

        let files = self.model_manager.text_model_files().await?;
        let config = self.config.text.clone();
        let threads = self.config.intra_threads;
        let embedder = tokio::task::spawn_blocking(move || TextEmbedder::load(&files, config, threads))
            .await
            .map_err(|e| EmbeddingError::ModelLoadFailed {
                reason: format!("Task join error: {}", e),
            })??;

        let embedder = Arc::new(embedder);
        *slot = Some(embedder.clone());
        tracing::info!("Text embedding model ready");
        Ok(embedder)
    }

    async fn image(&self) -> EmbeddingResult<Arc<ImageEmbedder>> {
        if let Some(embedder) = self.image_embedder.read().await.as_ref() {
            return Ok(embedder.clone());
        }

        let mut slot = self.image_embedder.write().await;
        if let Some(embedder) = slot.as_ref() {
            return Ok(embedder.clone());
        }

        let model = self.model_manager.vision_model_file().await?;
        let config = self.config.vision.clone();
        let threads = self.config.intra_threads;
        let embedder =
            tokio::task::spawn_blocking(move || ImageEmbedder::load(&model, config, threads))
                .await
                .map_err(|e| EmbeddingError::ModelLoadFailed {
                    reason: format!("Task join error: {}", e),
                })??;

        let embedder = Arc::new(embedder);
        *slot = Some(embedder.clone());
        tracing::info!("Image embedding model ready");
        Ok(embedder)
    }
}

#[async_trait]
impl TextEncoder for EmbeddingEngine {
    async fn embed_text(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.text().await?.embed(text).await
    }

    fn dimension(&self) -> usize {
        self.config.text.embedding_dim
    }
}

#[async_trait]
impl ImageEncoder for EmbeddingEngine {
    async fn embed_image_bytes(&self, data: Vec<u8>) -> EmbeddingResult<Vec<f32>> {
        self.image().await?.embed(data).await
    }

    fn dimension(&self) -> usize {
        self.config.vision.embedding_dim
    }
}

/// Pick the preferred output name, falling back to the first output
pub(crate) fn select_output(names: &[String], preferred: &str) -> Option<String> {
    names
        .iter()
        .find(|name| name.as_str() == preferred)
        .or_else(|| names.first())
        .cloned()
}

/// First row of a `[batch, dim]` (or `[dim]`) output, L2-normalised
pub(crate) fn first_embedding(
    shape: &[usize],
    values: &[f32],
    expected_dim: usize,
) -> EmbeddingResult<Vec<f32>> {
    let width = match shape {
        [_, width] | [width] => *width,
        other => {
            return Err(EmbeddingError::InferenceFailed {
                reason: format!("unexpected output shape {:?}", other),
            })
        }
    };

    if width != expected_dim {
        return Err(EmbeddingError::InvalidDimension {
            expected: expected_dim,
            actual: width,
        });
    }
    if values.len() < width {
        return Err(EmbeddingError::InferenceFailed {
            reason: format!("output holds {} values, expected {}", values.len(), width),
        });
    }

    let mut embedding = values[..width].to_vec();
    l2_normalize(&mut embedding);
    Ok(embedding)
}
