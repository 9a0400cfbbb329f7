//! Configuration file parser for ~/.config/shelf/config.toml.
//!
//! The config file is optional; a missing file yields `Config::default()`.
//! Unknown keys are ignored by serde, though we log a warning when the file
//! contains potential typos.
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::FetchSettings;
use crate::download::DownloadSettings;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// SEC-014: Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Budget for loading a catalog feed, in seconds.
    pub feed_timeout_secs: u64,

    /// Budget for each entry's sub-feed, in seconds.
    pub detail_timeout_secs: u64,

    /// Budget for an EPUB download, in seconds.
    pub download_timeout_secs: u64,

    /// Largest feed body accepted, in bytes.
    pub max_feed_bytes: usize,

    /// Largest EPUB accepted, in bytes.
    pub max_download_bytes: usize,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// Where downloaded books are saved. Defaults to the working directory.
    pub download_dir: Option<PathBuf>,

    /// Whether catalog URLs may point at localhost or private networks.
    pub allow_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        let fetch = FetchSettings::default();
        let download = DownloadSettings::default();
        Self {
            feed_timeout_secs: fetch.feed_timeout.as_secs(),
            detail_timeout_secs: fetch.detail_timeout.as_secs(),
            download_timeout_secs: download.timeout.as_secs(),
            max_feed_bytes: fetch.max_feed_bytes,
            max_download_bytes: download.max_bytes,
            user_agent: concat!("shelf/", env!("CARGO_PKG_VERSION")).to_string(),
            download_dir: None,
            allow_private_hosts: true,
        }
    }
}

impl Config {
    /// SEC-014: Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 8] = [
        "feed_timeout_secs",
        "detail_timeout_secs",
        "download_timeout_secs",
        "max_feed_bytes",
        "max_download_bytes",
        "user_agent",
        "download_dir",
        "allow_private_hosts",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // SEC-014: Check file size before reading
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Race condition: file deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Request budgets for catalog loading. Zero timeouts fall back to defaults.
    pub fn fetch_settings(&self) -> FetchSettings {
        let defaults = FetchSettings::default();
        FetchSettings {
            feed_timeout: secs_or(self.feed_timeout_secs, defaults.feed_timeout),
            detail_timeout: secs_or(self.detail_timeout_secs, defaults.detail_timeout),
            max_feed_bytes: self.max_feed_bytes,
        }
    }

    /// Budgets for EPUB downloads. A zero timeout falls back to the default.
    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings {
            timeout: secs_or(self.download_timeout_secs, DownloadSettings::default().timeout),
            max_bytes: self.max_download_bytes,
        }
    }

    /// Directory downloads are saved to.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Builds the shared HTTP client.
    ///
    /// No client-wide timeout is set; every request carries its own budget.
    pub fn http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
    }
}

fn secs_or(secs: u64, default: Duration) -> Duration {
    if secs == 0 {
        tracing::warn!(default_secs = default.as_secs(), "Ignoring zero timeout in config");
        default
    } else {
        Duration::from_secs(secs)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(name: &str, content: &str) -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.feed_timeout_secs, 10);
        assert_eq!(config.detail_timeout_secs, 5);
        assert_eq!(config.download_timeout_secs, 30);
        assert!(config.allow_private_hosts);
        assert!(config.user_agent.starts_with("shelf/"));
        assert_eq!(config.download_dir(), PathBuf::from("."));
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/shelf_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.feed_timeout_secs, 10);
    }

    #[test]
    fn test_whitespace_only_file_returns_default() {
        let (dir, path) = write_config("shelf_config_test_whitespace", "   \n  \n  ");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.detail_timeout_secs, 5);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_partial_config_uses_defaults_for_missing() {
        let (dir, path) = write_config("shelf_config_test_partial", "detail_timeout_secs = 2\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.detail_timeout_secs, 2);
        assert_eq!(config.feed_timeout_secs, 10);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let (dir, path) = write_config(
            "shelf_config_test_full",
            r#"
feed_timeout_secs = 20
detail_timeout_secs = 3
download_timeout_secs = 120
max_feed_bytes = 1024
max_download_bytes = 4096
user_agent = "my-reader/1.0"
download_dir = "/srv/books"
allow_private_hosts = false
"#,
        );

        let config = Config::load(&path).unwrap();
        let fetch = config.fetch_settings();
        assert_eq!(fetch.feed_timeout, Duration::from_secs(20));
        assert_eq!(fetch.detail_timeout, Duration::from_secs(3));
        assert_eq!(fetch.max_feed_bytes, 1024);

        let download = config.download_settings();
        assert_eq!(download.timeout, Duration::from_secs(120));
        assert_eq!(download.max_bytes, 4096);

        assert_eq!(config.user_agent, "my-reader/1.0");
        assert_eq!(config.download_dir(), PathBuf::from("/srv/books"));
        assert!(!config.allow_private_hosts);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_zero_timeout_falls_back() {
        let (dir, path) = write_config("shelf_config_test_zero", "feed_timeout_secs = 0\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.fetch_settings().feed_timeout, Duration::from_secs(10));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let (dir, path) = write_config("shelf_config_test_invalid", "this is not [valid toml");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let (dir, path) = write_config(
            "shelf_config_test_unknown",
            "feed_timeout_secs = 7\ntheme = \"dark\"\n",
        );
        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed_timeout_secs, 7);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_wrong_type_returns_error() {
        let (dir, path) =
            write_config("shelf_config_test_wrongtype", "feed_timeout_secs = \"ten\"\n");
        assert!(Config::load(&path).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }

    // SEC-014: File size limit
    #[test]
    fn test_too_large_file_rejected() {
        let (dir, path) = write_config("shelf_config_test_too_large", &"a".repeat(1_048_577));
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_http_client_builds() {
        assert!(Config::default().http_client().is_ok());
    }
}
