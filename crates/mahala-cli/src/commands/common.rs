use mahala_crypto::{fingerprint_hex_from_device, generate_device_salt};
use mahala_light::{ChainStateSnapshot, LightClient, LightClientConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

pub const DEFAULT_NODE_URL: &str = "http://localhost:3030";

/// Outcome of the last successful sync, kept so `balance` works offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSync {
    pub address: String,
    pub full_node_url: String,
    pub snapshot: ChainStateSnapshot,
}

/// Global options resolved once in `main`.
pub struct Settings {
    pub node: Option<String>,
    pub config: Option<PathBuf>,
    pub data_dir: PathBuf,
    pub device_id: Option<String>,
}

impl Settings {
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| self.data_dir.join("config.toml"))
    }

    pub fn last_sync_path(&self) -> PathBuf {
        self.data_dir.join("last_sync.json")
    }

    /// Config file (explicit or in the data dir), else defaults. `--node` wins
    /// over the file's URL.
    pub fn light_config(&self) -> CliResult<LightClientConfig> {
        let path = self.config_path();
        let mut config = if self.config.is_some() || path.exists() {
            LightClientConfig::load_from_file(&path)?
        } else {
            LightClientConfig::for_url(DEFAULT_NODE_URL)
        };
        if let Some(url) = &self.node {
            config.full_node_url = url.clone();
        }
        Ok(config)
    }

    /// SHA-256 of `device_id:salt`. Both halves are created once and kept in
    /// the data dir, so the same directory always yields the same wallet.
    pub fn fingerprint(&self) -> CliResult<String> {
        let salt = load_or_create(&self.data_dir.join("device_salt"), generate_device_salt)?;
        let device_id = match &self.device_id {
            Some(id) => id.clone(),
            None => load_or_create(&self.data_dir.join("device_id"), generate_device_salt)?,
        };
        Ok(fingerprint_hex_from_device(&device_id, &salt))
    }

    /// Engine initialized against the configured node with this device's wallet.
    pub fn open(&self) -> CliResult<(Arc<LightClient>, String)> {
        let client = LightClient::new();
        client.initialize_with(self.light_config()?)?;
        let address = client.derive_wallet(&self.fingerprint()?)?;
        Ok((Arc::new(client), address))
    }
}

/// Read a one-line secret from `path`, creating it on first use.
pub fn load_or_create(path: &Path, generate: impl FnOnce() -> String) -> CliResult<String> {
    if path.exists() {
        let value = fs::read_to_string(path)?.trim().to_string();
        if !value.is_empty() {
            return Ok(value);
        }
    }
    let value = generate();
    fs::write(path, &value)?;
    Ok(value)
}

pub fn save_last_sync(path: &Path, record: &LastSync) -> CliResult<()> {
    fs::write(path, serde_json::to_string_pretty(record)?)?;
    Ok(())
}

pub fn load_last_sync(path: &Path) -> CliResult<Option<LastSync>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}
