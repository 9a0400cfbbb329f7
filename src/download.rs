//! EPUB acquisition for a [`Book`]'s primary download link.
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::ACCEPT;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use crate::catalog::Book;
use crate::util::http::{content_type, read_limited_bytes, BodyError, EPUB_ACCEPT};
use crate::util::safe_filename;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_DOWNLOAD_SIZE: usize = 200 * 1024 * 1024; // 200MB

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Download failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Download timed out after {0:?}")]
    Timeout(Duration),
    #[error("Download failed (HTTP {0})")]
    HttpStatus(u16),
    /// Server answered with something other than an EPUB
    #[error("Invalid file type received: {0:?}")]
    NotEpub(String),
    #[error("Book has no EPUB download link")]
    MissingDownloadLink,
    #[error("Download too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Failed to save book: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BodyError> for DownloadError {
    fn from(e: BodyError) -> Self {
        match e {
            BodyError::Network(e) => DownloadError::Network(e),
            BodyError::TooLarge(limit) => DownloadError::ResponseTooLarge(limit),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Budget for the whole transfer, body included.
    pub timeout: Duration,
    pub max_bytes: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DOWNLOAD_TIMEOUT,
            max_bytes: MAX_DOWNLOAD_SIZE,
        }
    }
}

/// Fetches an EPUB payload.
///
/// # Errors
///
/// - [`DownloadError::HttpStatus`] - Non-2xx response
/// - [`DownloadError::NotEpub`] - `Content-Type` does not mention "epub"
/// - [`DownloadError::Timeout`] / [`DownloadError::Network`] / [`DownloadError::ResponseTooLarge`]
pub async fn fetch_epub(
    client: &reqwest::Client,
    url: &str,
    settings: &DownloadSettings,
) -> Result<Vec<u8>, DownloadError> {
    tokio::time::timeout(settings.timeout, fetch_epub_inner(client, url, settings.max_bytes))
        .await
        .map_err(|_| DownloadError::Timeout(settings.timeout))?
}

async fn fetch_epub_inner(
    client: &reqwest::Client,
    url: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, DownloadError> {
    let response = client.get(url).header(ACCEPT, EPUB_ACCEPT).send().await?;

    if !response.status().is_success() {
        return Err(DownloadError::HttpStatus(response.status().as_u16()));
    }

    let content_type = content_type(&response);
    if !content_type.contains("epub") {
        return Err(DownloadError::NotEpub(content_type));
    }

    Ok(read_limited_bytes(response, max_bytes).await?)
}

/// Downloads a book's EPUB into `dir`, named after its title.
///
/// The file is written under a temporary name and renamed into place, so a
/// failed transfer never leaves a partial `.epub` behind.
pub async fn download_book(
    client: &reqwest::Client,
    book: &Book,
    settings: &DownloadSettings,
    dir: &Path,
) -> Result<PathBuf, DownloadError> {
    let url = book
        .download_url
        .as_deref()
        .ok_or(DownloadError::MissingDownloadLink)?;

    tracing::info!(title = %book.title, url = %url, "Downloading book");
    let bytes = fetch_epub(client, url, settings).await?;

    let path = dir.join(safe_filename(&book.title));
    write_atomically(&path, &bytes).await?;

    tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved book");
    Ok(path)
}

async fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    // SEC-009: Unpredictable temp name, created exclusively
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = path.with_extension(format!("epub.tmp.{:016x}", suffix));

    let result = async {
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&temp_path, path).await?;
        Ok::<(), std::io::Error>(())
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_path).await;
    }
    result
}
