//! Multimodal Search - text-to-image similarity search
//!
//! This crate provides:
//! - CLIP text and vision embeddings through ONNX Runtime
//! - A Qdrant-backed vector store with an in-memory stand-in
//! - Query search and batch image indexing
//! - An axum search page with a JSON API
//! - Layered configuration and tracing-based logging

pub mod config;
pub mod core;
pub mod embeddings;
pub mod indexer;
pub mod logging;
pub mod search;
pub mod vector;
pub mod web;

// Re-export commonly used items
pub use crate::config::{QdrantCredentials, Settings, SettingsLoader};
pub use crate::core::error::{AppError, Result};
pub use crate::core::types::ImageHit;
pub use crate::embeddings::{EmbeddingEngine, ImageEncoder, TextEncoder};
pub use crate::indexer::{ImageIndexer, IndexReport};
pub use crate::search::{SearchService, SearchError};
pub use crate::vector::{MemoryStore, QdrantStore, VectorBackend, VectorError};
pub use crate::web::{WebConfig, WebServer};
