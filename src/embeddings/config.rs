//! Configuration for the embedding engine

use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Main configuration for the embedding engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Directory holding downloaded model files
    pub cache_dir: PathBuf,

    /// Base URL of the model hub (files live under `<repo>/resolve/main/<file>`)
    pub hf_base_url: String,

    /// Download missing model files on first use
    pub auto_download: bool,

    /// Download timeout in seconds
    pub download_timeout_secs: u64,

    /// Intra-op threads for each ONNX session
    pub intra_threads: usize,

    /// Text tower configuration
    pub text: TextEmbeddingConfig,

    /// Vision tower configuration
    pub vision: ImageEmbeddingConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            hf_base_url: "https://huggingface.co".to_string(),
            auto_download: true,
            download_timeout_secs: 600,
            intra_threads: 4,
            text: TextEmbeddingConfig::default(),
            vision: ImageEmbeddingConfig::default(),
        }
    }
}

impl EmbeddingConfig {
    /// Use a custom cache directory
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Disable automatic downloads
    pub fn offline(mut self) -> Self {
        self.auto_download = false;
        self
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("multimodal-search")
        .join("models")
}

/// Configuration for the CLIP text model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextEmbeddingConfig {
    /// Model repository on the hub
    pub repo: String,

    /// ONNX model filename inside the repository
    pub model_file: String,

    /// Tokenizer definition filename
    pub tokenizer_file: String,

    /// Optional SHA-256 of the model file
    pub model_sha256: Option<String>,

    /// Maximum number of tokens (CLIP context length)
    pub max_text_length: usize,

    /// Embedding dimension (512 for CLIP ViT-B/32)
    pub embedding_dim: usize,
}

impl Default for TextEmbeddingConfig {
    fn default() -> Self {
        Self {
            repo: "Qdrant/clip-ViT-B-32-text".to_string(),
            model_file: "model.onnx".to_string(),
            tokenizer_file: "tokenizer.json".to_string(),
            model_sha256: None,
            max_text_length: 77,
            embedding_dim: 512,
        }
    }
}

/// Configuration for the CLIP vision model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageEmbeddingConfig {
    /// Model repository on the hub
    pub repo: String,

    /// ONNX model filename inside the repository
    pub model_file: String,

    /// Optional SHA-256 of the model file
    pub model_sha256: Option<String>,

    /// Input image size (width and height)
    pub image_size: u32,

    /// Embedding dimension (512 for CLIP ViT-B/32)
    pub embedding_dim: usize,
}

impl Default for ImageEmbeddingConfig {
    fn default() -> Self {
        Self {
            repo: "Qdrant/clip-ViT-B-32-vision".to_string(),
            model_file: "model.onnx".to_string(),
            model_sha256: None,
            image_size: 224,
            embedding_dim: 512,
        }
    }
}

/// Model type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// CLIP text tower
    Text,

    /// CLIP vision tower
    Image,
}

impl std::fmt::Display for ModelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelType::Text => write!(f, "text"),
            ModelType::Image => write!(f, "image"),
        }
    }
}
