//! Vector store configuration

use serde::Deserialize;

/// Distance metric for vector similarity
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Distance {
    /// Cosine similarity (normalized dot product)
    #[default]
    Cosine,
    /// Euclidean distance (L2)
    Euclidean,
    /// Dot product (inner product)
    Dot,
}

impl Distance {
    pub(crate) fn to_qdrant(self) -> qdrant_client::qdrant::Distance {
        match self {
            Distance::Cosine => qdrant_client::qdrant::Distance::Cosine,
            Distance::Euclidean => qdrant_client::qdrant::Distance::Euclid,
            Distance::Dot => qdrant_client::qdrant::Distance::Dot,
        }
    }
}

/// Connection settings for the hosted Qdrant service.
///
/// `url` and `api_key` are normally filled from `QDRANT_URL` and
/// `QDRANT_API_KEY`; see [`crate::config::Settings::credentials`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QdrantConfig {
    /// gRPC endpoint, e.g. `https://xyz.cloud.qdrant.io:6334`
    pub url: Option<String>,

    /// API key for the cluster
    pub api_key: Option<secrecy::SecretString>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// The collection queried by search and filled by the indexer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Collection name in Qdrant
    pub name: String,

    /// Vector dimension (must match embedding model output)
    pub vector_size: u64,

    /// Distance metric used when the indexer creates the collection
    pub distance: Distance,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            name: "image_search_python_streamlit".to_string(),
            vector_size: 512, // CLIP ViT-B/32 output dimension
            distance: Distance::default(),
        }
    }
}

impl CollectionConfig {
    /// Create a new config with custom collection name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Create a new config with custom vector size
    pub fn with_vector_size(mut self, size: u64) -> Self {
        self.vector_size = size;
        self
    }

    /// Create a new config with custom distance metric
    pub fn with_distance(mut self, distance: Distance) -> Self {
        self.distance = distance;
        self
    }
}
