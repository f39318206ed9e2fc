//! Model Manager for locating, downloading and loading ONNX models
//!
//! Files are cached as `<cache_dir>/<repo with '/' replaced by '--'>/<file>`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

use super::config::{EmbeddingConfig, ModelType};
use super::download::ModelDownloader;
use super::error::{EmbeddingError, EmbeddingResult};

/// On-disk files needed by the text tower
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextModelFiles {
    pub model: PathBuf,
    pub tokenizer: PathBuf,
}

/// Resolves model files in the cache, downloading them when allowed
pub struct ModelManager {
    config: EmbeddingConfig,
    downloader: ModelDownloader,
}

impl ModelManager {
    /// Create a new model manager
    pub fn new(config: EmbeddingConfig) -> EmbeddingResult<Self> {
        let downloader = ModelDownloader::new(
            config.hf_base_url.clone(),
            Duration::from_secs(config.download_timeout_secs),
        )?;

        Ok(Self { config, downloader })
    }

    /// Cache directory holding all model files
    pub fn cache_dir(&self) -> &Path {
        &self.config.cache_dir
    }

    /// Local path for a repository file
    pub fn model_path(&self, repo: &str, file: &str) -> PathBuf {
        self.config.cache_dir.join(repo_dir_name(repo)).join(file)
    }

    /// Return the cached path for a file, downloading it first if needed
    pub async fn ensure_file(
        &self,
        repo: &str,
        file: &str,
        sha256: Option<&str>,
    ) -> EmbeddingResult<PathBuf> {
        let path = self.model_path(repo, file);
        if path.is_file() {
            return Ok(path);
        }

        if !self.config.auto_download {
            return Err(EmbeddingError::ModelNotFound {
                path: path.to_string_lossy().to_string(),
            });
        }

        self.downloader.download(repo, file, &path, sha256).await?;
        Ok(path)
    }

    /// Model and tokenizer for the text tower
    pub async fn text_model_files(&self) -> EmbeddingResult<TextModelFiles> {
        let text = &self.config.text;
        let model = self
            .ensure_file(&text.repo, &text.model_file, text.model_sha256.as_deref())
            .await?;
        let tokenizer = self.ensure_file(&text.repo, &text.tokenizer_file, None).await?;

        Ok(TextModelFiles { model, tokenizer })
    }

    /// Model file for the vision tower
    pub async fn vision_model_file(&self) -> EmbeddingResult<PathBuf> {
        let vision = &self.config.vision;
        self.ensure_file(&vision.repo, &vision.model_file, vision.model_sha256.as_deref())
            .await
    }

    /// Fetch every model file, returning the local paths
    pub async fn fetch_all(&self) -> EmbeddingResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for model_type in [ModelType::Text, ModelType::Image] {
            for (repo, file, sha256) in self.required_files(model_type) {
                paths.push(self.ensure_file(&repo, &file, sha256.as_deref()).await?);
            }
        }
        Ok(paths)
    }

    fn required_files(&self, model_type: ModelType) -> Vec<(String, String, Option<String>)> {
        match model_type {
            ModelType::Text => {
                let text = &self.config.text;
                vec![
                    (text.repo.clone(), text.model_file.clone(), text.model_sha256.clone()),
                    (text.repo.clone(), text.tokenizer_file.clone(), None),
                ]
            }
            ModelType::Image => {
                let vision = &self.config.vision;
                vec![(
                    vision.repo.clone(),
                    vision.model_file.clone(),
                    vision.model_sha256.clone(),
                )]
            }
        }
    }
}

/// Directory name for a repository inside the cache
pub(crate) fn repo_dir_name(repo: &str) -> String {
    repo.replace('/', "--")
}

/// Build an ONNX session for a model file. Blocking.
pub(crate) fn load_session(path: &Path, intra_threads: usize) -> EmbeddingResult<Session> {
    if !path.is_file() {
        return Err(EmbeddingError::ModelNotFound {
            path: path.to_string_lossy().to_string(),
        });
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(intra_threads.max(1))?
        .commit_from_file(path)
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("{}: {}", path.display(), e),
        })?;

    tracing::info!("Loaded ONNX model {}", path.display());
    Ok(session)
}
