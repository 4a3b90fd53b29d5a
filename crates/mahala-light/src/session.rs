//! One synchronization pass.
//!
//! A session is single use: it moves the engine from `Running` to
//! `Succeeded` or `Failed` (see [`SyncState`]). The three lookups run
//! concurrently; the cache is written only after all of them succeeded, and
//! then in one replacement. Any failure leaves the snapshot as it was.
//! There is no retry inside a session.

use crate::cache::{ChainStateCache, ChainStateSnapshot};
use crate::error::Result;
use crate::network::{NetworkClient, SelectionStatus};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where the engine stands with respect to its latest sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Nothing synced yet and nothing running.
    Idle,
    Running,
    Succeeded,
    /// The latest attempt failed or was cancelled; the snapshot is older.
    Failed,
}

/// What a successful session learned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub snapshot: ChainStateSnapshot,
    pub selection: SelectionStatus,
    pub completed_at: DateTime<Utc>,
}

pub struct SyncSession {
    client: Arc<NetworkClient>,
    cache: Arc<ChainStateCache>,
    address: String,
}

impl SyncSession {
    pub fn new(client: Arc<NetworkClient>, cache: Arc<ChainStateCache>, address: String) -> Self {
        Self {
            client,
            cache,
            address,
        }
    }

    /// Drive the session to completion.
    ///
    /// Dropping the returned future before it resolves abandons the lookups
    /// and leaves the cache untouched.
    pub async fn run(self) -> Result<SyncReport> {
        debug!("Sync started for {}", self.address);

        let fetched = tokio::try_join!(
            self.client.fetch_balance(&self.address),
            self.client.fetch_daily_dividend(&self.address),
            self.client.fetch_validator_selection(&self.address),
        );

        let completed_at = Utc::now();
        match fetched {
            Ok((balance, daily_dividend, selection)) => {
                let snapshot = ChainStateSnapshot::synced(balance, daily_dividend, completed_at);
                self.cache.replace(snapshot.clone());
                info!(
                    "✅ Sync complete for {}: balance {} MHL, daily dividend {} MHL",
                    self.address, balance, daily_dividend
                );
                Ok(SyncReport {
                    snapshot,
                    selection,
                    completed_at,
                })
            }
            Err(e) => {
                self.cache.record_failure(e.clone(), completed_at);
                warn!("❌ Sync failed for {}: {}", self.address, e);
                Err(e)
            }
        }
    }
}
