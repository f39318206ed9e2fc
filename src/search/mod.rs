//! Search module
//!
//! Turns a text query into a CLIP embedding and asks the vector backend
//! for the closest images.

mod error;
mod service;


pub use error::{SearchError, SearchResult, SEARCH_FAILED_MESSAGE};
pub use service::{CollectionStatus, SearchConfig, SearchService};
