//! Error types for the embedding engine

use thiserror::Error;

/// Result type for embedding operations
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors that can occur during embedding operations
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Model file not found
    #[error("Model not found: {path}")]
    ModelNotFound { path: String },

    /// Model loading failed
    #[error("Model loading failed: {reason}")]
    ModelLoadFailed { reason: String },

    /// Model download failed
    #[error("Model download failed: {reason}")]
    DownloadFailed { reason: String },

    /// Downloaded file does not match its checksum
    #[error("Checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// Tokenization failed
    #[error("Tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    /// Image processing failed
    #[error("Image processing failed: {reason}")]
    ImageProcessingFailed { reason: String },

    /// Inference failed
    #[error("Inference failed: {reason}")]
    InferenceFailed { reason: String },

    /// Model output has an unexpected size
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// ONNX runtime error
    #[error("ONNX runtime error: {0}")]
    OnnxError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<ort::Error> for EmbeddingError {
    fn from(err: ort::Error) -> Self {
        EmbeddingError::OnnxError(err.to_string())
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::DownloadFailed {
            reason: err.to_string(),
        }
    }
}

impl EmbeddingError {
    /// Whether the error concerns a single input rather than the model
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            EmbeddingError::ImageProcessingFailed { .. }
                | EmbeddingError::TokenizationFailed { .. }
        )
    }
}
