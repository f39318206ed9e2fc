//! Image Embedder using the CLIP vision tower
//!
//! Preprocessing follows CLIP: shortest side to 224, center crop,
//! per-channel normalisation, NCHW layout.

use std::path::Path;
use std::sync::Arc;

use image::{imageops::FilterType, DynamicImage};
use ort::session::Session;
use ort::value::Tensor;
use parking_lot::Mutex;

use super::config::ImageEmbeddingConfig;
use super::error::{EmbeddingError, EmbeddingResult};
use super::model_manager::load_session;
use super::{first_embedding, select_output};

/// CLIP channel means
pub const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
/// CLIP channel standard deviations
pub const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// Preferred output of the vision graph
const IMAGE_OUTPUT: &str = "image_embeds";

/// Image embedder over an ONNX session
pub struct ImageEmbedder {
    session: Arc<Mutex<Session>>,
    config: ImageEmbeddingConfig,
}

impl ImageEmbedder {
    /// Load the vision model. Blocking.
    pub fn load(
        model: &Path,
        config: ImageEmbeddingConfig,
        intra_threads: usize,
    ) -> EmbeddingResult<Self> {
        let session = load_session(model, intra_threads)?;
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            config,
        })
    }

    /// Embed image from raw bytes
    pub async fn embed(&self, image_data: Vec<u8>) -> EmbeddingResult<Vec<f32>> {
        let session = self.session.clone();
        let size = self.config.image_size;
        let embedding_dim = self.config.embedding_dim;

        // Decoding and resizing are CPU-bound; keep them off the runtime too
        tokio::task::spawn_blocking(move || {
            let image = decode_image(&image_data)?;
            let pixels = preprocess_image(&image, size);
            run_inference_sync(&session, pixels, size, embedding_dim)
        })
        .await
        .map_err(|e| EmbeddingError::InferenceFailed {
            reason: format!("Task join error: {}", e),
        })?
    }
}

pub(crate) fn decode_image(data: &[u8]) -> EmbeddingResult<DynamicImage> {
    image::load_from_memory(data).map_err(|e| EmbeddingError::ImageProcessingFailed {
        reason: format!("Failed to decode image: {}", e),
    })
}

/// Resize, crop and normalise into a `3 * size * size` NCHW buffer
pub(crate) fn preprocess_image(image: &DynamicImage, size: u32) -> Vec<f32> {
    let cropped = image.resize_to_fill(size, size, FilterType::CatmullRom);
    let rgb = cropped.to_rgb8();

    let plane = (size as usize) * (size as usize);
    let mut pixel_data = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in rgb.enumerate_pixels() {
        let idx = (y as usize) * (size as usize) + (x as usize);
        for c in 0..3 {
            let value = pixel[c] as f32 / 255.0;
            pixel_data[c * plane + idx] = (value - CLIP_MEAN[c]) / CLIP_STD[c];
        }
    }

    pixel_data
}

fn run_inference_sync(
    session: &Mutex<Session>,
    pixels: Vec<f32>,
    size: u32,
    embedding_dim: usize,
) -> EmbeddingResult<Vec<f32>> {
    let side = size as usize;
    let input = Tensor::from_array(([1usize, 3, side, side], pixels))?;

    let session = session.lock();
    let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
    let output_name =
        select_output(&output_names, IMAGE_OUTPUT).ok_or_else(|| EmbeddingError::InferenceFailed {
            reason: "model has no outputs".to_string(),
        })?;

    let outputs = session.run(ort::inputs!["pixel_values" => input]?)?;

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
