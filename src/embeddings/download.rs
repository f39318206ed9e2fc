//! Model file downloads from the Hugging Face hub

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use sha2::{Digest, Sha256};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use super::error::{EmbeddingError, EmbeddingResult};

/// Interval between progress log lines
const PROGRESS_INTERVAL: Duration = Duration::from_secs(2);

/// Streams hub files into the model cache
pub struct ModelDownloader {
    client: reqwest::Client,
    base_url: String,
}

impl ModelDownloader {
    /// Create a downloader for the given hub base URL
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> EmbeddingResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Download URL for a file in a repository
    pub fn file_url(&self, repo: &str, file: &str) -> String {
        format!(
            "{}/{}/resolve/main/{}",
            self.base_url.trim_end_matches('/'),
            repo,
            file
        )
    }

    /// Download `repo/file` into `target`, returning the byte count.
    ///
    /// Data is written to `<target>.part` and renamed once complete, so an
    /// interrupted download never leaves a truncated model in place.
    pub async fn download(
        &self,
        repo: &str,
        file: &str,
        target: &Path,
        expected_sha256: Option<&str>,
    ) -> EmbeddingResult<u64> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }

        let url = self.file_url(repo, file);
        let partial = partial_path(target);
        tracing::info!("Downloading {} to {}", url, target.display());

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(EmbeddingError::DownloadFailed {
                reason: format!("HTTP {} for {}", response.status(), url),
            });
        }

        let total_size: Option<u64> = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());

        let mut out = File::create(&partial).await?;
        let mut hasher = Sha256::new();
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();
        let mut last_report = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            out.write_all(&chunk).await?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if last_report.elapsed() >= PROGRESS_INTERVAL {
                last_report = Instant::now();
                match total_size {
                    Some(total) if total > 0 => tracing::info!(
                        "{}: {:.1}% ({} / {} bytes)",
                        file,
                        downloaded as f64 * 100.0 / total as f64,
                        downloaded,
                        total
                    ),
                    _ => tracing::info!("{}: {} bytes", file, downloaded),
                }
            }
        }

        out.flush().await?;
        drop(out);

        if let Some(expected) = expected_sha256 {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                fs::remove_file(&partial).await.ok();
                return Err(EmbeddingError::ChecksumMismatch {
                    file: file.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
        }

        fs::rename(&partial, target).await?;
        tracing::info!("Downloaded {} ({} bytes)", file, downloaded);
        Ok(downloaded)
    }
}

/// Sibling path used while a download is in flight
pub(crate) fn partial_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    target.with_file_name(name)
}
