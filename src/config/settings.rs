//! Layered settings: defaults, optional TOML file, environment

use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::embeddings::EmbeddingConfig;
use crate::indexer::IndexerConfig;
use crate::logging::LoggingConfig;
use crate::search::SearchConfig;
use crate::vector::{CollectionConfig, QdrantConfig};
use crate::web::WebConfig;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_NAME: &str = "multimodal-search";

/// Prefix for environment overrides (`MMSEARCH__SERVER__PORT=9000`)
pub const ENV_PREFIX: &str = "MMSEARCH";

/// Qdrant endpoint variable
pub const QDRANT_URL_VAR: &str = "QDRANT_URL";

/// Qdrant API key variable
pub const QDRANT_API_KEY_VAR: &str = "QDRANT_API_KEY";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Failed to read .env file: {0}")]
    Dotenv(String),

    #[error("Missing required environment variables: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<String> },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete application settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Qdrant connection
    pub qdrant: QdrantConfig,
    /// Target collection
    pub collection: CollectionConfig,
    /// CLIP models and their cache
    pub models: EmbeddingConfig,
    /// Result limits
    pub search: SearchConfig,
    /// HTTP server and page layout
    pub server: WebConfig,
    /// Image ingestion
    pub indexer: IndexerConfig,
    /// Tracing output
    pub logging: LoggingConfig,
}

/// Validated Qdrant credentials
#[derive(Debug, Clone)]
pub struct QdrantCredentials {
    pub url: String,
    pub api_key: SecretString,
}

impl Settings {
    /// Load settings from the default sources
    pub fn load() -> ConfigResult<Self> {
        SettingsLoader::new().load()
    }

    /// Qdrant URL and API key, or the list of missing variables
    pub fn credentials(&self) -> ConfigResult<QdrantCredentials> {
        let url = self
            .qdrant
            .url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty());
        let api_key = self
            .qdrant
            .api_key
            .as_ref()
            .filter(|k| !k.expose_secret().trim().is_empty());

        match (url, api_key) {
            (Some(url), Some(api_key)) => Ok(QdrantCredentials {
                url: url.to_string(),
                api_key: api_key.clone(),
            }),
            (url, api_key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(QDRANT_URL_VAR.to_string());
                }
                if api_key.is_none() {
                    missing.push(QDRANT_API_KEY_VAR.to_string());
                }
                Err(ConfigError::MissingCredentials { missing })
            }
        }
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> ConfigResult<()> {
        if self.search.default_limit == 0 {
            return Err(ConfigError::Invalid(
                "search.default_limit must be at least 1".to_string(),
            ));
        }
        if self.search.max_limit < self.search.default_limit {
            return Err(ConfigError::Invalid(format!(
                "search.max_limit ({}) must not be below search.default_limit ({})",
                self.search.max_limit, self.search.default_limit
            )));
        }
        if !(1..=12).contains(&self.server.columns) {
            return Err(ConfigError::Invalid(format!(
                "server.columns must be between 1 and 12, got {}",
                self.server.columns
            )));
        }
        if self.collection.vector_size == 0 {
            return Err(ConfigError::Invalid(
                "collection.vector_size must be positive".to_string(),
            ));
        }
        if self.indexer.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "indexer.batch_size must be at least 1".to_string(),
            ));
        }
        if self.models.text.embedding_dim as u64 != self.collection.vector_size {
            return Err(ConfigError::Invalid(format!(
                "models.text.embedding_dim ({}) does not match collection.vector_size ({})",
                self.models.text.embedding_dim, self.collection.vector_size
            )));
        }
        Ok(())
    }
}

/// Builder for [`Settings`]
#[derive(Debug, Default)]
pub struct SettingsLoader {
    config_file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
    skip_dotenv: bool,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file instead of the default `multimodal-search.toml`; it must exist
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Use this map instead of the process environment
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Do not read `.env`
    pub fn skip_dotenv(mut self) -> Self {
        self.skip_dotenv = true;
        self
    }

    /// Merge all sources and validate the result
    pub fn load(self) -> ConfigResult<Settings> {
        if !self.skip_dotenv {
            load_dotenv()?;
        }

        let env: HashMap<String, String> = match self.env {
            Some(env) => env,
            None => std::env::vars().collect(),
        };

        let file = match &self.config_file {
            Some(path) => ::config::File::from(path.as_path()).required(true),
            None => ::config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings: Settings = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            )
            .set_override_option("qdrant.url", non_empty(&env, QDRANT_URL_VAR))?
            .set_override_option("qdrant.api_key", non_empty(&env, QDRANT_API_KEY_VAR))?
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }
}

fn non_empty(env: &HashMap<String, String>, key: &str) -> Option<String> {
    env.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn load_dotenv() -> ConfigResult<()> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(ConfigError::Dotenv(e.to_string())),
    }
}
