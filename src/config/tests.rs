//! Tests for Configuration Module

use super::*;
use std::collections::HashMap;
use std::path::PathBuf;

use secrecy::ExposeSecret;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn load(pairs: &[(&str, &str)]) -> ConfigResult<Settings> {
    SettingsLoader::new().skip_dotenv().with_env(env(pairs)).load()
}

fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("settings.toml");
    std::fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_defaults() {
    let settings = load(&[]).unwrap();

    assert_eq!(settings.collection.name, "image_search_python_streamlit");
    assert_eq!(settings.collection.vector_size, 512);
    assert_eq!(settings.search.default_limit, 5);
    assert_eq!(settings.server.port, 8501);
    assert_eq!(settings.server.columns, 3);
    assert!(settings.qdrant.url.is_none());
    assert!(settings.qdrant.api_key.is_none());
}

#[test]
fn test_prefixed_env_overrides() {
    let settings = load(&[
        ("MMSEARCH__SERVER__PORT", "9000"),
        ("MMSEARCH__COLLECTION__NAME", "listings"),
        ("MMSEARCH__SEARCH__MAX_LIMIT", "20"),
        ("UNRELATED", "ignored"),
    ])
    .unwrap();

    assert_eq!(settings.server.port, 9000);
    assert_eq!(settings.collection.name, "listings");
    assert_eq!(settings.search.max_limit, 20);
}

#[test]
fn test_qdrant_credentials_from_env() {
    let settings = load(&[
        (QDRANT_URL_VAR, " https://cluster.example.cloud:6334 "),
        (QDRANT_API_KEY_VAR, "s3cret"),
    ])
    .unwrap();

    let creds = settings.credentials().unwrap();
    assert_eq!(creds.url, "https://cluster.example.cloud:6334");
    assert_eq!(creds.api_key.expose_secret(), "s3cret");
}

#[test]
fn test_missing_credentials_lists_both() {
    let settings = load(&[]).unwrap();

    match settings.credentials() {
        Err(ConfigError::MissingCredentials { missing }) => {
            assert_eq!(missing, vec![QDRANT_URL_VAR, QDRANT_API_KEY_VAR]);
        }
        other => panic!("expected MissingCredentials, got {:?}", other),
    }
}

#[test]
fn test_blank_credentials_count_as_missing() {
    let settings = load(&[(QDRANT_URL_VAR, "http://localhost:6334"), (QDRANT_API_KEY_VAR, "   ")])
        .unwrap();

    let err = settings.credentials().unwrap_err();
    assert!(matches!(
        &err,
        ConfigError::MissingCredentials { missing } if missing == &vec![QDRANT_API_KEY_VAR.to_string()]
    ));
    assert_eq!(
        err.to_string(),
        "Missing required environment variables: QDRANT_API_KEY"
    );
}

#[test]
fn test_config_file_values() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
[collection]
name = "from_file"

[server]
port = 8080
image_root = "/srv/photos"

[indexer]
batch_size = 8
"#,
    );

    let settings = SettingsLoader::new()
        .skip_dotenv()
        .with_env(env(&[("MMSEARCH__SERVER__PORT", "8090")]))
        .with_config_file(&path)
        .load()
        .unwrap();

    assert_eq!(settings.collection.name, "from_file");
    assert_eq!(settings.server.image_root, PathBuf::from("/srv/photos"));
    assert_eq!(settings.indexer.batch_size, 8);
    // Environment wins over the file
    assert_eq!(settings.server.port, 8090);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = SettingsLoader::new()
        .skip_dotenv()
        .with_env(HashMap::new())
        .with_config_file(dir.path().join("absent.toml"))
        .load();

    assert!(matches!(result, Err(ConfigError::Load(_))));
}

#[test]
fn test_invalid_values_rejected() {
    let result = load(&[("MMSEARCH__SEARCH__DEFAULT_LIMIT", "0")]);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    let result = load(&[("MMSEARCH__SERVER__COLUMNS", "13")]);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));

    let result = load(&[("MMSEARCH__INDEXER__BATCH_SIZE", "0")]);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_validate_limits() {
    let mut settings = Settings::default();
    assert!(settings.validate().is_ok());

    settings.search.default_limit = 10;
    settings.search.max_limit = 5;
    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("search.max_limit"));
}

#[test]
fn test_validate_embedding_dimension() {
    let mut settings = Settings::default();
    settings.collection.vector_size = 768;

    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("embedding_dim"));
}
