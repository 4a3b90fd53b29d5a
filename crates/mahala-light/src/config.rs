use crate::error::{LightClientError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_READ_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Light client settings. Only the endpoint is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightClientConfig {
    pub full_node_url: String,
    /// Upper bound for one read request, connect included.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self {
            full_node_url: String::new(),
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
        }
    }
}

/// A validated full-node endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base_url: String,
    read_timeout: Duration,
    connect_timeout: Duration,
}

impl Endpoint {
    /// Base URL without trailing slash; request paths are appended verbatim.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl LightClientConfig {
    pub fn for_url(full_node_url: impl Into<String>) -> Self {
        Self {
            full_node_url: full_node_url.into(),
            ..Self::default()
        }
    }

    /// Load config from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            LightClientError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            LightClientError::Configuration(format!("invalid config {}: {}", path.display(), e))
        })
    }

    /// Load config from environment variables
    pub fn load_from_env() -> Result<Self> {
        let full_node_url = std::env::var("MAHALA_NODE_URL")
            .map_err(|_| LightClientError::Configuration("MAHALA_NODE_URL not set".to_string()))?;

        let parse_ms = |key: &str, default: u64| -> Result<u64> {
            match std::env::var(key) {
                Ok(v) => v.parse().map_err(|_| {
                    LightClientError::Configuration(format!("{} must be milliseconds, got {:?}", key, v))
                }),
                Err(_) => Ok(default),
            }
        };

        Ok(Self {
            full_node_url,
            read_timeout_ms: parse_ms("MAHALA_READ_TIMEOUT_MS", DEFAULT_READ_TIMEOUT_MS)?,
            connect_timeout_ms: parse_ms("MAHALA_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?,
        })
    }

    /// Save config to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LightClientError::Configuration(e.to_string()))?;
        fs::write(path, content).map_err(|e| {
            LightClientError::Configuration(format!("cannot write {}: {}", path.display(), e))
        })
    }

    /// Validate configuration and produce the endpoint the network client uses.
    pub fn validate(&self) -> Result<Endpoint> {
        let raw = self.full_node_url.as_str();
        if raw.trim().is_empty() {
            return Err(LightClientError::Configuration(
                "full node URL is empty".to_string(),
            ));
        }

        let url = Url::parse(raw).map_err(|e| {
            LightClientError::Configuration(format!("malformed full node URL {:?}: {}", raw, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(LightClientError::Configuration(format!(
                "unsupported scheme {:?}, expected http or https",
                url.scheme()
            )));
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(LightClientError::Configuration(format!(
                "full node URL {:?} has no host",
                raw
            )));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(LightClientError::Configuration(format!(
                "full node URL {:?} must not carry a query or fragment",
                raw
            )));
        }
        if self.read_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(LightClientError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        Ok(Endpoint {
            base_url: url.as_str().trim_end_matches('/').to_string(),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
        })
    }
}
