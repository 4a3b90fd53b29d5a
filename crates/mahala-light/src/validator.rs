//! Validator participation monitor.
//!
//! One poll per call: ask the node whether the local address is the selected
//! validator, keep only the latest answer, and announce positive answers to
//! subscribers. Answers are tagged with the monitor epoch they were asked
//! under; a reset bumps the epoch, so answers about a previous wallet or
//! endpoint are dropped instead of recorded. Cadence belongs to the host. Signing and block submission
//! are not done here; a selected wallet is only reported.

use crate::error::{LightClientError, Result};
use crate::network::{NetworkClient, SelectionStatus};
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

const EVENT_CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorSelection {
    pub is_selected: bool,
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidatorEvent {
    Selected {
        address: String,
        round: Option<u64>,
        as_of: DateTime<Utc>,
    },
}

/// Participation counters since process start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorStats {
    pub polls: u64,
    pub times_selected: u64,
}

#[derive(Default)]
struct MonitorState {
    epoch: u64,
    latest: Option<ValidatorSelection>,
    stats: ValidatorStats,
}

pub struct ValidatorMonitor {
    state: Mutex<MonitorState>,
    events: broadcast::Sender<ValidatorEvent>,
}

impl ValidatorMonitor {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(MonitorState::default()),
            events,
        }
    }

    /// Current epoch. Read it together with the address being polled.
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Run one selection check for `address`, asked under `epoch`.
    ///
    /// Fails with `Concurrency` when the monitor was reset while the lookup
    /// was in flight.
    pub async fn poll(
        &self,
        client: &NetworkClient,
        address: &str,
        epoch: u64,
    ) -> Result<ValidatorSelection> {
        let status = client.fetch_validator_selection(address).await?;
        self.record(epoch, address, status, Utc::now())
            .ok_or(LightClientError::Concurrency(
                "wallet or endpoint changed during the validator check",
            ))
    }

    /// Store a selection answer obtained elsewhere (e.g. during a sync).
    /// Returns `None` and records nothing when `epoch` is no longer current.
    pub fn record(
        &self,
        epoch: u64,
        address: &str,
        status: SelectionStatus,
        as_of: DateTime<Utc>,
    ) -> Option<ValidatorSelection> {
        let selection = ValidatorSelection {
            is_selected: status.selected,
            as_of,
        };
        {
            let mut state = self.lock();
            if state.epoch != epoch {
                debug!("Dropping selection answer for {} from epoch {}", address, epoch);
                return None;
            }
            state.latest = Some(selection);
            state.stats.polls += 1;
            if status.selected {
                state.stats.times_selected += 1;
            }
        }

        if status.selected {
            info!("🗳️ Wallet {} selected as validator (round {:?})", address, status.round);
            // No subscribers is fine: the answer is still returned to the caller.
            let _ = self.events.send(ValidatorEvent::Selected {
                address: address.to_string(),
                round: status.round,
                as_of,
            });
        } else {
            debug!("Wallet {} not selected", address);
        }
        Some(selection)
    }

    pub fn latest(&self) -> Option<ValidatorSelection> {
        self.lock().latest
    }

    pub fn stats(&self) -> ValidatorStats {
        self.lock().stats
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ValidatorEvent> {
        self.events.subscribe()
    }

    /// Forget the latest answer and counters (new endpoint or wallet) and
    /// start a new epoch.
    pub fn reset(&self) {
        let mut state = self.lock();
        *state = MonitorState {
            epoch: state.epoch.wrapping_add(1),
            ..MonitorState::default()
        };
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for ValidatorMonitor {
    fn default() -> Self {
        Self::new()
    }
}
