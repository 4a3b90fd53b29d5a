// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MAHALA - LIGHT CLIENT ENGINE
//
// The six-operation surface hosts call into:
//   initialize, derive_wallet, get_balance, get_daily_dividend,
//   check_validator_selection, sync
//
// Concurrency rules:
// - At most one sync session runs at a time. Overlapping `sync()` calls
//   attach to the running session and all receive its outcome.
// - Reads only touch the snapshot cache and never wait on network I/O.
// - Locks are std locks held for a few instructions, never across `.await`.
//   Order: in-flight slot, then connection/wallet.
// - A session is cancelled by `cancel_sync()` or when every caller waiting
//   on it has gone away. The snapshot is left untouched in both cases and
//   the cancellation is recorded as the latest failed attempt.
// - Endpoint and wallet changes reset the cache and the validator monitor
//   before their locks are released, so no reader or new session sees the
//   new identity paired with the old chain state.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::amount::Amount;
use crate::cache::{ChainStateCache, SyncStatus};
use crate::config::{Endpoint, LightClientConfig};
use crate::error::{LightClientError, Result};
use crate::network::{Connector, HttpConnector, NetworkClient};
use crate::session::{SyncReport, SyncSession, SyncState};
use crate::validator::{ValidatorEvent, ValidatorMonitor, ValidatorSelection, ValidatorStats};
use chrono::Utc;
use futures::future::{AbortHandle, Abortable, Aborted, BoxFuture, FutureExt, Shared};
use mahala_crypto::WalletIdentity;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

type SharedSync = Shared<BoxFuture<'static, Result<SyncReport>>>;
type Slot = Arc<Mutex<Option<InFlight>>>;

fn safe_lock<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn safe_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn safe_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// The running session and the callers attached to it.
struct InFlight {
    generation: u64,
    future: SharedSync,
    abort: AbortHandle,
    waiters: usize,
}

impl InFlight {
    /// A finished entry may linger until its first caller wakes up.
    fn is_running(&self) -> bool {
        self.future.peek().is_none()
    }
}

/// Detaches one caller from the in-flight session on every exit path,
/// including the caller's future being dropped mid-await.
struct Waiter {
    slot: Slot,
    cache: Arc<ChainStateCache>,
    generation: u64,
    finished: bool,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        let mut slot = safe_lock(&self.slot);
        let entry = match slot.as_mut() {
            Some(entry) if entry.generation == self.generation => entry,
            _ => return,
        };
        if self.finished {
            *slot = None;
            return;
        }
        entry.waiters = entry.waiters.saturating_sub(1);
        if entry.waiters == 0 {
            entry.abort.abort();
            if entry.is_running() {
                self.cache
                    .record_failure(LightClientError::Cancelled, Utc::now());
            }
            *slot = None;
            debug!("Every caller left sync #{}; session dropped", self.generation);
        }
    }
}

struct Connection {
    endpoint: Endpoint,
    client: Arc<NetworkClient>,
}

pub struct LightClient {
    connector: Arc<dyn Connector>,
    connection: RwLock<Option<Connection>>,
    wallet: RwLock<Option<Arc<WalletIdentity>>>,
    cache: Arc<ChainStateCache>,
    monitor: Arc<ValidatorMonitor>,
    in_flight: Slot,
    derive_lock: Mutex<()>,
    generation: AtomicU64,
}

impl LightClient {
    /// Engine talking HTTP/JSON to the full node.
    pub fn new() -> Self {
        Self::with_connector(Arc::new(HttpConnector))
    }

    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            connection: RwLock::new(None),
            wallet: RwLock::new(None),
            cache: Arc::new(ChainStateCache::new()),
            monitor: Arc::new(ValidatorMonitor::new()),
            in_flight: Arc::new(Mutex::new(None)),
            derive_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    // ─────────────────────────────────────────────────────────────
    // LIFECYCLE
    // ─────────────────────────────────────────────────────────────

    pub fn initialize(&self, full_node_url: &str) -> Result<()> {
        self.initialize_with(LightClientConfig::for_url(full_node_url))
    }

    /// Configure the full-node endpoint.
    ///
    /// Repeating the current URL is a no-op. A different URL drops the cached
    /// snapshot and validator state but keeps the derived wallet.
    pub fn initialize_with(&self, config: LightClientConfig) -> Result<()> {
        let endpoint = config.validate()?;

        let in_flight = safe_lock(&self.in_flight);
        if in_flight.as_ref().map_or(false, InFlight::is_running) {
            return Err(LightClientError::Concurrency(
                "cannot re-initialize while a sync is in flight",
            ));
        }

        let mut connection = safe_write(&self.connection);
        let previous_url = connection
            .as_ref()
            .map(|c| c.endpoint.base_url().to_string());
        if let Some(current) = connection.as_ref() {
            if current.endpoint == endpoint {
                debug!("Already initialized against {}", endpoint.base_url());
                return Ok(());
            }
        }

        let transport = self.connector.connect(&endpoint)?;
        let client = Arc::new(NetworkClient::new(transport, endpoint.read_timeout()));
        info!("🌐 Light client using full node {}", endpoint.base_url());
        let endpoint_changed = previous_url
            .as_deref()
            .map_or(false, |url| url != endpoint.base_url());
        *connection = Some(Connection { endpoint, client });
        if endpoint_changed {
            self.cache.reset();
            self.monitor.reset();
            info!("Full node changed; cached chain state cleared");
        }
        Ok(())
    }

    /// Derive the wallet identity from the host's fingerprint and return its address.
    ///
    /// Overlapping calls are serialized; callers passing the same fingerprint
    /// all get the same address.
    pub fn derive_wallet(&self, fingerprint_hex: &str) -> Result<String> {
        let _derive = safe_lock(&self.derive_lock);
        if !self.is_initialized() {
            return Err(LightClientError::NotInitialized(
                "initialize must succeed before deriving a wallet",
            ));
        }

        let identity = mahala_crypto::derive_identity(fingerprint_hex)?;
        let address = identity.address().to_string();

        let in_flight = safe_lock(&self.in_flight);
        let mut wallet = safe_write(&self.wallet);
        let switching = match wallet.as_ref() {
            Some(current) if current.address() == address => {
                debug!("Wallet {} re-derived", address);
                return Ok(address);
            }
            Some(_) => true,
            None => false,
        };
        if switching && in_flight.as_ref().map_or(false, InFlight::is_running) {
            return Err(LightClientError::Concurrency(
                "cannot switch wallet while a sync is in flight",
            ));
        }
        *wallet = Some(Arc::new(identity));
        if switching {
            self.cache.reset();
            self.monitor.reset();
        }
        drop(wallet);
        drop(in_flight);
        info!("🔑 Wallet ready: {}", address);
        Ok(address)
    }

    // ─────────────────────────────────────────────────────────────
    // READS
    // ─────────────────────────────────────────────────────────────

    pub fn get_balance(&self) -> Result<Amount> {
        self.cache.balance()
    }

    pub fn get_daily_dividend(&self) -> Result<Amount> {
        self.cache.daily_dividend()
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.cache.status()
    }

    pub fn wallet_address(&self) -> Option<String> {
        safe_read(&self.wallet)
            .as_ref()
            .map(|w| w.address().to_string())
    }

    pub fn full_node_url(&self) -> Option<String> {
        safe_read(&self.connection)
            .as_ref()
            .map(|c| c.endpoint.base_url().to_string())
    }

    pub fn is_initialized(&self) -> bool {
        safe_read(&self.connection).is_some()
    }

    pub fn is_sync_in_flight(&self) -> bool {
        safe_lock(&self.in_flight)
            .as_ref()
            .map_or(false, InFlight::is_running)
    }

    pub fn sync_state(&self) -> SyncState {
        if self.is_sync_in_flight() {
            return SyncState::Running;
        }
        let status = self.cache.status();
        if status.is_stale() {
            SyncState::Failed
        } else if status.snapshot.is_synced() {
            SyncState::Succeeded
        } else {
            SyncState::Idle
        }
    }

    // ─────────────────────────────────────────────────────────────
    // VALIDATOR PARTICIPATION
    // ─────────────────────────────────────────────────────────────

    /// One selection poll for the current wallet.
    ///
    /// A wallet or endpoint change while the lookup is in flight discards the
    /// answer and reports `Concurrency`.
    pub async fn check_validator_selection(&self) -> Result<bool> {
        let (client, wallet, epoch) = {
            let connection = safe_read(&self.connection);
            let wallet = safe_read(&self.wallet);
            let client = connection
                .as_ref()
                .map(|c| c.client.clone())
                .ok_or(LightClientError::NotInitialized("no full node configured"))?;
            let wallet = wallet
                .clone()
                .ok_or(LightClientError::NotInitialized("no wallet derived"))?;
            (client, wallet, self.monitor.epoch())
        };
        let selection = self.monitor.poll(&client, wallet.address(), epoch).await?;
        Ok(selection.is_selected)
    }

    pub fn last_validator_selection(&self) -> Option<ValidatorSelection> {
        self.monitor.latest()
    }

    pub fn validator_stats(&self) -> ValidatorStats {
        self.monitor.stats()
    }

    pub fn subscribe_validator_events(&self) -> broadcast::Receiver<ValidatorEvent> {
        self.monitor.subscribe()
    }

    // ─────────────────────────────────────────────────────────────
    // SYNC
    // ─────────────────────────────────────────────────────────────

    /// Run one sync session, or join the one already running.
    pub async fn sync(&self) -> Result<SyncReport> {
        let (future, generation) = {
            let mut slot = safe_lock(&self.in_flight);
            match slot.as_mut() {
                Some(entry) if entry.is_running() => {
                    entry.waiters += 1;
                    debug!(
                        "Joining sync #{} ({} callers)",
                        entry.generation, entry.waiters
                    );
                    (entry.future.clone(), entry.generation)
                }
                _ => {
                    let client = self.client()?;
                    let wallet = self.wallet()?;
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let (future, abort) = self.start_session(
                        client,
                        wallet.address().to_string(),
                        generation,
                        self.monitor.epoch(),
                    );
                    *slot = Some(InFlight {
                        generation,
                        future: future.clone(),
                        abort,
                        waiters: 1,
                    });
                    (future, generation)
                }
            }
        };

        let mut waiter = Waiter {
            slot: self.in_flight.clone(),
            cache: self.cache.clone(),
            generation,
            finished: false,
        };
        let outcome = future.await;
        waiter.finished = true;
        outcome
    }

    /// Abort the running session. Every attached caller receives `Cancelled`
    /// and the attempt is recorded as failed. Returns false when nothing was
    /// running.
    pub fn cancel_sync(&self) -> bool {
        let mut slot = safe_lock(&self.in_flight);
        match slot.take() {
            Some(entry) if entry.is_running() => {
                entry.abort.abort();
                self.cache
                    .record_failure(LightClientError::Cancelled, Utc::now());
                warn!("Sync #{} cancelled by host", entry.generation);
                true
            }
            _ => false,
        }
    }

    fn start_session(
        &self,
        client: Arc<NetworkClient>,
        address: String,
        generation: u64,
        epoch: u64,
    ) -> (SharedSync, AbortHandle) {
        let (abort, registration) = AbortHandle::new_pair();
        let cache = self.cache.clone();
        let monitor = self.monitor.clone();
        debug!("Starting sync #{} for {}", generation, address);

        let future = async move {
            let session = SyncSession::new(client, cache, address.clone());
            match Abortable::new(session.run(), registration).await {
                Ok(Ok(report)) => {
                    monitor.record(epoch, &address, report.selection, report.completed_at);
                    Ok(report)
                }
                Ok(Err(e)) => Err(e),
                Err(Aborted) => Err(LightClientError::Cancelled),
            }
        }
        .boxed()
        .shared();

        (future, abort)
    }

    fn client(&self) -> Result<Arc<NetworkClient>> {
        safe_read(&self.connection)
            .as_ref()
            .map(|c| c.client.clone())
            .ok_or(LightClientError::NotInitialized("no full node configured"))
    }

    fn wallet(&self) -> Result<Arc<WalletIdentity>> {
        safe_read(&self.wallet)
            .clone()
            .ok_or(LightClientError::NotInitialized("no wallet derived"))
    }
}

impl Default for LightClient {
    fn default() -> Self {
        Self::new()
    }
}
