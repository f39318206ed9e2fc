//! Text Embedder using the CLIP text tower
//!
//! Tokenizes with the model's own `tokenizer.json` and runs the ONNX
//! graph on the blocking pool.

use std::path::Path;
use std::sync::Arc;

use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;
use tokenizers::{Tokenizer, TruncationParams};

use super::config::TextEmbeddingConfig;
use super::error::{EmbeddingError, EmbeddingResult};
use super::model_manager::{load_session, TextModelFiles};
use super::{first_embedding, select_output};

/// Preferred output of the text graph
const TEXT_OUTPUT: &str = "text_embeds";

/// Text embedder over an ONNX session
pub struct TextEmbedder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    config: TextEmbeddingConfig,
}

impl TextEmbedder {
    /// Load the model and tokenizer. Blocking.
    pub fn load(
        files: &TextModelFiles,
        config: TextEmbeddingConfig,
        intra_threads: usize,
    ) -> EmbeddingResult<Self> {
        let tokenizer = load_tokenizer(&files.tokenizer, config.max_text_length)?;
        let session = load_session(&files.model, intra_threads)?;

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            config,
        })
    }

    /// Embed a single text string
    pub async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        let (input_ids, attention_mask) =
            encode_text(&self.tokenizer, text, self.config.max_text_length)?;

        let session = self.session.clone();
        let embedding_dim = self.config.embedding_dim;

        tokio::task::spawn_blocking(move || {
            run_inference_sync(&session, input_ids, attention_mask, embedding_dim)
        })
        .await
        .map_err(|e| EmbeddingError::InferenceFailed {
            reason: format!("Task join error: {}", e),
        })?
    }
}

pub(crate) fn load_tokenizer(path: &Path, max_length: usize) -> EmbeddingResult<Tokenizer> {
    let mut tokenizer = Tokenizer::from_file(path).map_err(|e| EmbeddingError::ModelLoadFailed {
        reason: format!("{}: {}", path.display(), e),
    })?;

    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..Default::default()
        }))
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("tokenizer truncation: {}", e),
        })?;
    tokenizer.with_padding(None);

    Ok(tokenizer)
}

/// Token ids and attention mask for one text, capped at `max_length`
pub(crate) fn encode_text(
    tokenizer: &Tokenizer,
    text: &str,
    max_length: usize,
) -> EmbeddingResult<(Vec<i64>, Vec<i64>)> {
    let encoding = tokenizer
        .encode(text, true)
        .map_err(|e| EmbeddingError::TokenizationFailed {
            reason: e.to_string(),
        })?;

    let ids: Vec<i64> = encoding
        .get_ids()
        .iter()
        .take(max_length)
        .map(|&id| id as i64)
        .collect();
    let mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .take(max_length)
        .map(|&m| m as i64)
        .collect();

    if ids.is_empty() {
        return Err(EmbeddingError::TokenizationFailed {
            reason: "text produced no tokens".to_string(),
        });
    }

    Ok((ids, mask))
}

fn run_inference_sync(
    session: &Mutex<Session>,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    embedding_dim: usize,
) -> EmbeddingResult<Vec<f32>> {
    let seq_len = input_ids.len();
    let input_ids = Tensor::from_array(([1usize, seq_len], input_ids))?;
    let attention_mask = Tensor::from_array(([1usize, seq_len], attention_mask))?;

    let session = session.lock();
    let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
    let output_name =
        select_output(&output_names, TEXT_OUTPUT).ok_or_else(|| EmbeddingError::InferenceFailed {
            reason: "model has no outputs".to_string(),
        })?;
    let wants_mask = session.inputs.iter().any(|i| i.name == "attention_mask");

    let outputs = if wants_mask {
        session.run(ort::inputs![
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
        ]?)?
    } else {
        session.run(ort::inputs!["input_ids" => input_ids]?)?
    };

    let output = outputs
        .get(output_name.as_str())
        .ok_or_else(|| EmbeddingError::InferenceFailed {
            reason: format!("missing output '{}'", output_name),
        })?;
    let tensor = output.try_extract_tensor::<f32>()?;
    let shape = tensor.shape().to_vec();
    let values: Vec<f32> = tensor.iter().copied().collect();

    first_embedding(&shape, &values, embedding_dim)
}
