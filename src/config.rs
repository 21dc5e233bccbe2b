//! Client configuration.
//!
//! Values come from environment variables, with CLI flags taking precedence:
//! - `CREWPRESS_SERVER_URL` - Base URL of the generation server
//! - `CREWPRESS_DOWNLOAD_DIR` - Where downloaded articles are saved

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid server URL {url:?}: {reason}")]
    InvalidServerUrl { url: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without trailing slash.
    pub server_url: String,
    pub download_dir: PathBuf,
}

impl Config {
    pub fn new(
        server_url: impl Into<String>,
        download_dir: impl Into<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let mut server_url = server_url.into();
        while server_url.ends_with('/') {
            server_url.pop();
        }

        let parsed = url::Url::parse(&server_url).map_err(|e| ConfigError::InvalidServerUrl {
            url: server_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidServerUrl {
                url: server_url,
                reason: format!("unsupported scheme {}", parsed.scheme()),
            });
        }

        Ok(Self {
            server_url,
            download_dir: download_dir.into(),
        })
    }

    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(None, None)
    }

    /// Explicit values win over environment variables, which win over defaults.
    pub fn resolve(
        server_url: Option<String>,
        download_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let server_url = server_url
            .or_else(|| std::env::var("CREWPRESS_SERVER_URL").ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let download_dir = download_dir
            .or_else(|| std::env::var("CREWPRESS_DOWNLOAD_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(server_url, download_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = Config::new("http://localhost:5000/", ".").unwrap();
        assert_eq!(config.server_url, "http://localhost:5000");
    }

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(Config::new("not a url", ".").is_err());
        assert!(Config::new("ftp://example.com", ".").is_err());
    }

    #[test]
    fn test_explicit_values_win() {
        let config = Config::resolve(
            Some("https://articles.example.com".to_string()),
            Some(PathBuf::from("/tmp/articles")),
        )
        .unwrap();
        assert_eq!(config.server_url, "https://articles.example.com");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/articles"));
    }
}
