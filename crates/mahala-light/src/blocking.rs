//! Blocking wrapper for hosts without an async runtime.
//!
//! Owns a small multi-thread tokio runtime; every call blocks the calling
//! thread until the operation finishes. Must not be used from inside another
//! tokio runtime.

use crate::amount::Amount;
use crate::config::LightClientConfig;
use crate::engine::LightClient;
use crate::error::{LightClientError, Result};
use crate::network::{Connector, HttpConnector};
use crate::session::SyncReport;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

pub struct BlockingLightClient {
    runtime: Runtime,
    inner: LightClient,
}

impl BlockingLightClient {
    pub fn new() -> Result<Self> {
        Self::with_connector(Arc::new(HttpConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("mahala-light")
            .enable_all()
            .build()
            .map_err(|e| LightClientError::Configuration(format!("tokio runtime: {}", e)))?;
        Ok(Self {
            runtime,
            inner: LightClient::with_connector(connector),
        })
    }

    pub fn initialize(&self, full_node_url: &str) -> Result<()> {
        let _rt = self.runtime.enter();
        self.inner.initialize(full_node_url)
    }

    pub fn initialize_with(&self, config: LightClientConfig) -> Result<()> {
        let _rt = self.runtime.enter();
        self.inner.initialize_with(config)
    }

    pub fn derive_wallet(&self, fingerprint_hex: &str) -> Result<String> {
        self.inner.derive_wallet(fingerprint_hex)
    }

    pub fn get_balance(&self) -> Result<Amount> {
        self.inner.get_balance()
    }

    pub fn get_daily_dividend(&self) -> Result<Amount> {
        self.inner.get_daily_dividend()
    }

    pub fn check_validator_selection(&self) -> Result<bool> {
        self.runtime.block_on(self.inner.check_validator_selection())
    }

    pub fn sync(&self) -> Result<SyncReport> {
        self.runtime.block_on(self.inner.sync())
    }

    /// The async engine, for the extras not mirrored here.
    pub fn engine(&self) -> &LightClient {
        &self.inner
    }
}
