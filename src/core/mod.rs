//! Core types shared across the crate
//!
//! - Error types and user-facing messages
//! - Search hit records

pub mod error;
pub mod types;
pub mod utils;

pub use error::{AppError, Result};
pub use types::ImageHit;
