//! Configuration loading for the mailbox client
//!
//! Settings are resolved in this order, later sources winning:
//! 1. Built-in defaults
//! 2. JSON file (~/.config/mailwatch/mailwatch.json, or an explicit path)
//! 3. Environment variables (`MAILWATCH_USERNAME`, `MAILWATCH_POLL_INTERVAL_MS`,
//!    `MAILWATCH_BASE_URL`)

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;

/// Config filename in the mailwatch config directory
pub const CONFIG_FILE: &str = "mailwatch.json";

/// Default time between polls
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 20_000;

const ENV_USERNAME: &str = "MAILWATCH_USERNAME";
const ENV_POLL_INTERVAL: &str = "MAILWATCH_POLL_INTERVAL_MS";
const ENV_BASE_URL: &str = "MAILWATCH_BASE_URL";

/// Settings for a [`MailboxClient`](crate::MailboxClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Mailbox name to claim; `None` takes whatever the server assigns
    pub username: Option<String>,
    /// Milliseconds between polls, must be positive
    pub poll_interval_ms: u64,
    /// API endpoint
    pub base_url: String,
    /// Passed through to `set_email_user` / `get_email_address`
    pub lang: Option<String>,
    /// Passed through to `set_email_user` / `get_email_address`
    pub site: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            username: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            base_url: DEFAULT_BASE_URL.to_string(),
            lang: None,
            site: None,
        }
    }
}

impl ClientConfig {
    /// Load from the default config file if present, then apply env overrides
    pub fn load() -> Result<Self> {
        let base = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };
        base.with_env_overrides()?.validated()
    }

    /// Load from a specific JSON file, then apply env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file(path)?.with_env_overrides()?.validated()
    }

    /// Parse a JSON file without env overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        config::load_json_file(path)
    }

    /// Parse settings from a JSON string; missing keys take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse client config JSON")
    }

    /// Apply `MAILWATCH_*` environment variables
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(username) = config::env_override::<String>(ENV_USERNAME)? {
            self.username = Some(username);
        }
        if let Some(interval) = config::env_override::<u64>(ENV_POLL_INTERVAL)? {
            self.poll_interval_ms = interval;
        }
        if let Some(base_url) = config::env_override::<String>(ENV_BASE_URL)? {
            self.base_url = base_url;
        }
        Ok(self)
    }

    /// Normalize and check the settings
    ///
    /// A blank username is treated as no username.
    pub fn validated(mut self) -> Result<Self> {
        self.username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty());

        if self.poll_interval_ms == 0 {
            bail!("poll_interval_ms must be greater than zero");
        }

        let url = url::Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base_url: {}", self.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("base_url must be http or https, got {}", url.scheme());
        }

        Ok(self)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Get the default config file path (~/.config/mailwatch/mailwatch.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }

    /// Write these settings as the default config file
    pub fn save_default(&self) -> Result<PathBuf> {
        config::save_json(CONFIG_FILE, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.username, None);
        assert_eq!(cfg.poll_interval_ms, 20_000);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(20));
        assert_eq!(cfg.base_url, "https://api.guerrillamail.com/ajax.php");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg = ClientConfig::from_json(r#"{ "username": "alice" }"#).unwrap();
        assert_eq!(cfg.username.as_deref(), Some("alice"));
        assert_eq!(cfg.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn test_blank_username_means_none() {
        let cfg = ClientConfig {
            username: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(cfg.validated().unwrap().username, None);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cfg = ClientConfig {
            poll_interval_ms: 0,
            ..Default::default()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn test_bad_base_url_rejected() {
        let cfg = ClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(cfg.validated().is_err());

        let cfg = ClientConfig {
            base_url: "ftp://example.com/ajax.php".to_string(),
            ..Default::default()
        };
        assert!(cfg.validated().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(
            &path,
            r#"{ "poll_interval_ms": 1500, "site": "guerrillamail.com" }"#,
        )
        .unwrap();

        let cfg = ClientConfig::from_file(&path).unwrap();
        assert_eq!(cfg.poll_interval_ms, 1500);
        assert_eq!(cfg.site.as_deref(), Some("guerrillamail.com"));
    }

    #[test]
    fn test_invalid_json() {
        assert!(ClientConfig::from_json(r#"{ "poll_interval_ms": "soon" }"#).is_err());
    }
}
