//! Vector database access
//!
//! The hosted Qdrant collection is reached through [`QdrantStore`];
//! [`MemoryStore`] offers the same [`VectorBackend`] contract in-process.

mod config;
mod error;
mod memory;
mod qdrant;
mod store;


pub use config::{CollectionConfig, Distance, QdrantConfig};
pub use error::VectorError;
pub use memory::MemoryStore;
pub use qdrant::QdrantStore;
pub use store::{ScoredPoint, VectorBackend, VectorPoint, VectorResult};

/// Payload field names for vector points
pub mod payload_fields {
    /// Image path, as given to the indexer
    pub const PATH: &str = "path";
    /// File name without directories
    pub const FILE_NAME: &str = "file_name";
    /// Indexing timestamp (RFC 3339)
    pub const INDEXED_AT: &str = "indexed_at";
}
