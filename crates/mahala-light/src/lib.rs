// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MAHALA LIGHT CLIENT
//
// Tracks one wallet's view of the ledger without storing the chain:
// - wallet identity derived from a host-computed biometric fingerprint
// - balance and daily dividend cached from the last complete sync
// - validator selection polling with event notification
// Scheduling is the host's job; this crate only reacts to calls.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod amount;
pub mod blocking;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod network;
pub mod session;
pub mod validator;

#[cfg(test)]
mod mock;

pub use amount::{Amount, AmountError, AMOUNT_DECIMALS, UNITS_PER_MHL};
pub use blocking::BlockingLightClient;
pub use cache::{ChainStateSnapshot, SyncFailure, SyncStatus};
pub use config::LightClientConfig;
pub use engine::LightClient;
pub use error::{FetchKind, LightClientError, NetworkCause, Result};
pub use network::{Connector, FullNodeTransport, HttpConnector, SelectionStatus};
pub use session::{SyncReport, SyncState};
pub use validator::{ValidatorEvent, ValidatorSelection, ValidatorStats};
