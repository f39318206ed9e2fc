//! Search result types

use serde::{Deserialize, Serialize};

/// One image returned for a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageHit {
    /// Point id in the vector database
    pub id: Option<String>,

    /// Similarity score as reported by the vector database
    pub score: f32,

    /// Filesystem path stored in the point payload
    pub path: String,
}

impl ImageHit {
    /// Score formatted the way the UI shows it
    pub fn display_score(&self) -> String {
        format!("{:.2}", self.score)
    }
}
