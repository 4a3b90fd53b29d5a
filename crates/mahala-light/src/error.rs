use mahala_crypto::CryptoError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which full-node lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    Balance,
    DailyDividend,
    ValidatorSelection,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchKind::Balance => "balance",
            FetchKind::DailyDividend => "daily_dividend",
            FetchKind::ValidatorSelection => "validator_selection",
        })
    }
}

/// Underlying transport failure, kept for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkCause {
    #[error("node unreachable: {0}")]
    Unreachable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("node answered HTTP {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Every failure the engine reports to its host.
///
/// `Clone` so a single sync outcome can be handed to every caller attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightClientError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("not initialized: {0}")]
    NotInitialized(&'static str),

    #[error("derivation error: {0}")]
    Derivation(#[from] CryptoError),

    #[error("network error during {op}: {cause}")]
    Network { op: FetchKind, cause: NetworkCause },

    #[error("no sync has completed yet")]
    NotSynced,

    #[error("concurrency conflict: {0}")]
    Concurrency(&'static str),

    #[error("sync cancelled")]
    Cancelled,
}

impl LightClientError {
    pub fn network(op: FetchKind, cause: NetworkCause) -> Self {
        LightClientError::Network { op, cause }
    }
}

pub type Result<T> = std::result::Result<T, LightClientError>;
