//! Core data types

pub mod search;

pub use search::ImageHit;
