//! Tests for the embedding engine

use super::*;
use std::io::Write;
use tempfile::TempDir;

use super::download::partial_path;
use super::image_embedder::{decode_image, preprocess_image};
use super::model_manager::{load_session, repo_dir_name};
use super::text_embedder::{encode_text, load_tokenizer};

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.hf_base_url, "https://huggingface.co");
        assert!(config.auto_download);
        assert_eq!(config.text.repo, "Qdrant/clip-ViT-B-32-text");
        assert_eq!(config.vision.repo, "Qdrant/clip-ViT-B-32-vision");
        assert_eq!(config.text.max_text_length, 77);
        assert_eq!(config.vision.image_size, 224);
        assert_eq!(config.text.embedding_dim, 512);
        assert_eq!(config.vision.embedding_dim, 512);
        assert!(config.cache_dir.ends_with("models"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EmbeddingConfig =
            serde_json::from_str(r#"{"intra_threads": 2, "text": {"max_text_length": 32}}"#)
                .unwrap();
        assert_eq!(config.intra_threads, 2);
        assert_eq!(config.text.max_text_length, 32);
        assert_eq!(config.text.tokenizer_file, "tokenizer.json");
        assert_eq!(config.vision.model_file, "model.onnx");
    }

    #[test]
    fn test_model_type_display() {
        assert_eq!(ModelType::Text.to_string(), "text");
        assert_eq!(ModelType::Image.to_string(), "image");
    }
}

#[cfg(test)]
mod model_manager_tests {
    use super::*;

    fn offline_manager(dir: &TempDir) -> ModelManager {
        ModelManager::new(EmbeddingConfig::default().with_cache_dir(dir.path()).offline()).unwrap()
    }

    fn touch(path: &std::path::Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::File::create(path).unwrap().write_all(b"stub").unwrap();
    }

    #[test]
    fn test_repo_dir_name() {
        assert_eq!(repo_dir_name("Qdrant/clip-ViT-B-32-text"), "Qdrant--clip-ViT-B-32-text");
        assert_eq!(repo_dir_name("plain"), "plain");
    }

    #[test]
    fn test_model_path_layout() {
        let dir = TempDir::new().unwrap();
        let manager = offline_manager(&dir);

        let path = manager.model_path("Qdrant/clip-ViT-B-32-vision", "model.onnx");
        assert_eq!(
            path,
            dir.path().join("Qdrant--clip-ViT-B-32-vision").join("model.onnx")
        );
        assert_eq!(manager.cache_dir(), dir.path());
    }

    #[tokio::test]
    async fn test_missing_file_offline_is_not_found() {
        let dir = TempDir::new().unwrap();
        let manager = offline_manager(&dir);

        let result = manager.vision_model_file().await;
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));
    }

    #[tokio::test]
    async fn test_cached_files_resolve_without_download() {
        let dir = TempDir::new().unwrap();
        let manager = offline_manager(&dir);

        let model = manager.model_path("Qdrant/clip-ViT-B-32-text", "model.onnx");
        let tokenizer = manager.model_path("Qdrant/clip-ViT-B-32-text", "tokenizer.json");
        touch(&model);
        let result = manager.text_model_files().await;
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));

        touch(&tokenizer);

        let files = manager.text_model_files().await.unwrap();
        assert_eq!(files, TextModelFiles { model, tokenizer });
    }

    #[test]
    fn test_load_session_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = load_session(&dir.path().join("absent.onnx"), 1);
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));
    }

    #[test]
    fn test_download_url_and_partial_path() {
        let downloader =
            ModelDownloader::new("https://hub.example/", std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(
            downloader.file_url("Qdrant/clip-ViT-B-32-text", "tokenizer.json"),
            "https://hub.example/Qdrant/clip-ViT-B-32-text/resolve/main/tokenizer.json"
        );

        let partial = partial_path(std::path::Path::new("/cache/repo/model.onnx"));
        assert_eq!(partial, std::path::PathBuf::from("/cache/repo/model.onnx.part"));
    }

    #[tokio::test]
    async fn test_engine_offline_reports_missing_model() {
        let dir = TempDir::new().unwrap();
        let engine =
            EmbeddingEngine::new(EmbeddingConfig::default().with_cache_dir(dir.path()).offline())
                .unwrap();

        let result = engine.embed_text("a house with a pool").await;
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));

        let result = engine.preload_image().await;
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));

        // A failed load is not cached; the next call looks again
        let result = engine.preload_text().await;
        assert!(matches!(result, Err(EmbeddingError::ModelNotFound { .. })));
        assert_eq!(TextEncoder::dimension(&engine), 512);
        assert_eq!(ImageEncoder::dimension(&engine), 512);
    }
}

#[cfg(test)]
mod tokenizer_tests {
    use super::*;

    const WORD_LEVEL: &str = r#"{
        "version": "1.0",
        "truncation": null,
        "padding": null,
        "added_tokens": [],
        "normalizer": null,
        "pre_tokenizer": { "type": "Whitespace" },
        "post_processor": null,
        "decoder": null,
        "model": {
            "type": "WordLevel",
            "vocab": { "[UNK]": 0, "a": 1, "red": 2, "house": 3, "with": 4, "pool": 5 },
            "unk_token": "[UNK]"
        }
    }"#;

    fn write_tokenizer(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("tokenizer.json");
        std::fs::write(&path, WORD_LEVEL).unwrap();
        path
    }

    #[test]
    fn test_encode_text_ids_and_mask() {
        let dir = TempDir::new().unwrap();
        let tokenizer = load_tokenizer(&write_tokenizer(&dir), 77).unwrap();

        let (ids, mask) = encode_text(&tokenizer, "a red house", 77).unwrap();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(mask, vec![1, 1, 1]);
    }

    #[test]
    fn test_encode_text_truncates() {
        let dir = TempDir::new().unwrap();
        let tokenizer = load_tokenizer(&write_tokenizer(&dir), 3).unwrap();

        let (ids, mask) = encode_text(&tokenizer, "a red house with pool", 3).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(mask.len(), 3);
    }

    #[test]
    fn test_encode_empty_text_fails() {
        let dir = TempDir::new().unwrap();
        let tokenizer = load_tokenizer(&write_tokenizer(&dir), 77).unwrap();

        let result = encode_text(&tokenizer, "", 77);
        assert!(matches!(result, Err(EmbeddingError::TokenizationFailed { .. })));
    }

    #[test]
    fn test_missing_tokenizer_file() {
        let dir = TempDir::new().unwrap();
        let result = load_tokenizer(&dir.path().join("nope.json"), 77);
        assert!(matches!(result, Err(EmbeddingError::ModelLoadFailed { .. })));
    }
}

#[cfg(test)]
mod preprocessing_tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_preprocess_shape_and_values() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([255, 0, 128])));
        let pixels = preprocess_image(&image, 224);

        let plane = 224 * 224;
        assert_eq!(pixels.len(), 3 * plane);

        let expected_r = (1.0 - CLIP_MEAN[0]) / CLIP_STD[0];
        let expected_g = (0.0 - CLIP_MEAN[1]) / CLIP_STD[1];
        let expected_b = (128.0 / 255.0 - CLIP_MEAN[2]) / CLIP_STD[2];

        // A solid image stays solid after resize and crop
        let centre = 112 * 224 + 112;
        assert!((pixels[centre] - expected_r).abs() < 0.02);
        assert!((pixels[plane + centre] - expected_g).abs() < 0.02);
        assert!((pixels[2 * plane + centre] - expected_b).abs() < 0.02);
    }

    #[test]
    fn test_preprocess_small_image_upscales() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 40, Rgb([0, 0, 0])));
        let pixels = preprocess_image(&image, 32);
        assert_eq!(pixels.len(), 3 * 32 * 32);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let result = decode_image(b"definitely not an image");
        assert!(matches!(
            result,
            Err(EmbeddingError::ImageProcessingFailed { .. })
        ));
    }

    #[test]
    fn test_decode_png_bytes() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image.write_to(&mut bytes, image::ImageOutputFormat::Png).unwrap();

        let decoded = decode_image(bytes.get_ref()).unwrap();
        assert_eq!(decoded.width(), 4);
        assert_eq!(decoded.height(), 4);
    }
}

#[cfg(test)]
mod output_tests {
    use super::*;

    #[test]
    fn test_select_output_prefers_named() {
        let names = vec!["last_hidden_state".to_string(), "text_embeds".to_string()];
        assert_eq!(select_output(&names, "text_embeds").as_deref(), Some("text_embeds"));
        assert_eq!(
            select_output(&names, "image_embeds").as_deref(),
            Some("last_hidden_state")
        );
        assert_eq!(select_output(&[], "text_embeds"), None);
    }

    #[test]
    fn test_first_embedding_normalises_first_row() {
        let values = [3.0, 4.0, 100.0, 100.0];
        let embedding = first_embedding(&[2, 2], &values, 2).unwrap();
        assert!((embedding[0] - 0.6).abs() < 1e-6);
        assert!((embedding[1] - 0.8).abs() < 1e-6);

        let flat = first_embedding(&[2], &[0.0, 2.0], 2).unwrap();
        assert_eq!(flat, vec![0.0, 1.0]);
    }

    #[test]
    fn test_first_embedding_rejects_bad_shapes() {
        assert!(matches!(
            first_embedding(&[1, 4], &[0.0; 4], 512),
            Err(EmbeddingError::InvalidDimension {
                expected: 512,
                actual: 4
            })
        ));
        assert!(matches!(
            first_embedding(&[1, 2, 2], &[0.0; 4], 2),
            Err(EmbeddingError::InferenceFailed { .. })
        ));
        assert!(matches!(
            first_embedding(&[1, 4], &[0.0; 2], 4),
            Err(EmbeddingError::InferenceFailed { .. })
        ));
    }
}

#[cfg(test)]
mod encoder_trait_tests {
    use super::*;

    struct ByteLengthEncoder;

    #[async_trait::async_trait]
    impl ImageEncoder for ByteLengthEncoder {
        async fn embed_image_bytes(&self, data: Vec<u8>) -> EmbeddingResult<Vec<f32>> {
            Ok(vec![data.len() as f32])
        }

        fn dimension(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_embed_image_file_reads_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0u8; 7]).unwrap();

        let embedding = ByteLengthEncoder.embed_image_file(&path).await.unwrap();
        assert_eq!(embedding, vec![7.0]);
    }

    #[tokio::test]
    async fn test_embed_image_file_missing() {
        let dir = TempDir::new().unwrap();
        let result = ByteLengthEncoder
            .embed_image_file(&dir.path().join("gone.jpg"))
            .await;
        assert!(matches!(
            result,
            Err(EmbeddingError::ImageProcessingFailed { .. })
        ));
    }
}
