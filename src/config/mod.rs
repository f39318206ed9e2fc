//! Configuration Management Module
//!
//! Settings are merged from, lowest precedence first:
//! - built-in defaults
//! - an optional `multimodal-search.toml` (or `--config <path>`)
//! - `MMSEARCH__*` environment variables
//! - `QDRANT_URL` / `QDRANT_API_KEY`, also read from `.env`

mod settings;
#[cfg(test)]
mod tests;

pub use settings::{
    ConfigError, ConfigResult, QdrantCredentials, Settings, SettingsLoader,
    DEFAULT_CONFIG_NAME, ENV_PREFIX, QDRANT_API_KEY_VAR, QDRANT_URL_VAR,
};
