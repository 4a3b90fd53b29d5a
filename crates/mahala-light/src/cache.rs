//! Chain state cache.
//!
//! Holds the last snapshot produced by a completed sync. The snapshot is
//! replaced as a whole under a short write lock and never mutated field by
//! field. Readers take a read lock that is never held across network I/O.

use crate::amount::Amount;
use crate::error::{LightClientError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Recover from a poisoned lock instead of panicking; the guarded data is
/// always replaced wholesale, so it is never observed half-written.
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

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStateSnapshot {
    pub balance: Amount,
    pub daily_dividend: Amount,
    /// `None` until the first successful sync.
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    pub last_sync_succeeded: bool,
}

impl ChainStateSnapshot {
    pub fn empty() -> Self {
        Self {
            balance: Amount::ZERO,
            daily_dividend: Amount::ZERO,
            last_sync_timestamp: None,
            last_sync_succeeded: false,
        }
    }

    pub fn synced(balance: Amount, daily_dividend: Amount, at: DateTime<Utc>) -> Self {
        Self {
            balance,
            daily_dividend,
            last_sync_timestamp: Some(at),
            last_sync_succeeded: true,
        }
    }

    pub fn is_synced(&self) -> bool {
        self.last_sync_timestamp.is_some()
    }
}

impl Default for ChainStateSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// A sync attempt that ended without replacing the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    pub at: DateTime<Utc>,
    pub error: LightClientError,
}

/// Snapshot plus the most recent failed attempt, if it is newer than the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub snapshot: ChainStateSnapshot,
    pub last_failure: Option<SyncFailure>,
}

impl SyncStatus {
    /// True when the latest attempt failed and the snapshot is older than it.
    pub fn is_stale(&self) -> bool {
        self.last_failure.is_some()
    }
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: ChainStateSnapshot,
    last_failure: Option<SyncFailure>,
}

#[derive(Debug, Default)]
pub struct ChainStateCache {
    state: RwLock<CacheState>,
}

impl ChainStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ChainStateSnapshot {
        safe_read(&self.state).snapshot.clone()
    }

    pub fn balance(&self) -> Result<Amount> {
        let state = safe_read(&self.state);
        if !state.snapshot.is_synced() {
            return Err(LightClientError::NotSynced);
        }
        Ok(state.snapshot.balance)
    }

    pub fn daily_dividend(&self) -> Result<Amount> {
        let state = safe_read(&self.state);
        if !state.snapshot.is_synced() {
            return Err(LightClientError::NotSynced);
        }
        Ok(state.snapshot.daily_dividend)
    }

    /// Atomically supersede the snapshot and clear any recorded failure.
    pub fn replace(&self, snapshot: ChainStateSnapshot) {
        let mut state = safe_write(&self.state);
        state.snapshot = snapshot;
        state.last_failure = None;
    }

    /// Remember a failed attempt. The snapshot itself is left untouched.
    pub fn record_failure(&self, error: LightClientError, at: DateTime<Utc>) {
        safe_write(&self.state).last_failure = Some(SyncFailure { at, error });
    }

    pub fn status(&self) -> SyncStatus {
        let state = safe_read(&self.state);
        SyncStatus {
            snapshot: state.snapshot.clone(),
            last_failure: state.last_failure.clone(),
        }
    }

    /// Back to the empty snapshot (new wallet or new endpoint).
    pub fn reset(&self) {
        self.replace(ChainStateSnapshot::empty());
    }
}
