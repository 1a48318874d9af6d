use std::path::Path;
use std::time::Duration;

use mogile_http::TransferOptions;
use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Client settings, usually read from a TOML table:
///
/// ```toml
/// domain = "media"
/// readonly = false
/// read_timeout_ms = 10000
/// ```
///
/// Timeouts left out fall back to the [`TransferOptions`] defaults; a
/// timeout of `0` disables that limit.
///
/// # Examples
///
/// ```
/// use mogile_client::ClientConfig;
///
/// let config = ClientConfig::from_toml_str("domain = \"media\"\nreadonly = true").unwrap();
/// assert_eq!(config.domain, "media");
/// assert!(config.readonly);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Namespace every key lives in. Must not be empty.
    pub domain: String,

    /// Refuse every mutating operation locally.
    #[serde(default)]
    pub readonly: bool,

    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,

    #[serde(default)]
    pub read_timeout_ms: Option<u64>,

    #[serde(default)]
    pub write_timeout_ms: Option<u64>,

    #[serde(default)]
    pub chunk_size: Option<usize>,
}

impl ClientConfig {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain:             domain.into(),
            readonly:           false,
            connect_timeout_ms: None,
            read_timeout_ms:    None,
            write_timeout_ms:   None,
            chunk_size:         None,
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&raw)
    }

    #[must_use]
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    #[must_use]
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.read_timeout_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.write_timeout_ms = Some(ms);
        self
    }

    #[must_use]
    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.domain.trim().is_empty() {
            return Err(ClientError::Config("domain must not be empty".into()));
        }
        if self.chunk_size == Some(0) {
            return Err(ClientError::Config("chunk_size must be positive".into()));
        }
        Ok(())
    }

    /// Transport settings derived from this config.
    pub fn transfer_options(&self) -> TransferOptions {
        let defaults = TransferOptions::default();
        let mut options = TransferOptions::default()
            .connect_timeout(timeout(self.connect_timeout_ms, defaults.connect_timeout))
            .read_timeout(timeout(self.read_timeout_ms, defaults.read_timeout))
            .write_timeout(timeout(self.write_timeout_ms, defaults.write_timeout));
        if let Some(chunk_size) = self.chunk_size {
            options = options.chunk_size(chunk_size);
        }
        options
    }
}

fn timeout(ms: Option<u64>, default: Option<Duration>) -> Option<Duration> {
    match ms {
        None => default,
        Some(0) => None,
        Some(ms) => Some(Duration::from_millis(ms)),
    }
}
