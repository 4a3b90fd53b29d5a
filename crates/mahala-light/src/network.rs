// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MAHALA - FULL NODE CLIENT
//
// Read-only lookups against one configured full node.
// - GET /blockchain/balance/{address}
// - GET /du/daily/{address}
// - GET /consensus/validator/{address}
// No retries here: every failure surfaces once, labelled with the lookup.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::amount::Amount;
use crate::config::Endpoint;
use crate::error::{FetchKind, LightClientError, NetworkCause, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Request/response transport to a full node.
#[async_trait]
pub trait FullNodeTransport: Send + Sync {
    /// GET `path` (absolute, starting with `/`) and decode the body as JSON.
    async fn get_json(&self, path: &str) -> std::result::Result<serde_json::Value, NetworkCause>;
}

/// Builds a transport for a validated endpoint. Injected into the engine so
/// hosts and tests can swap the wire.
pub trait Connector: Send + Sync {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn FullNodeTransport>>;
}

/// HTTP/JSON transport over reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(endpoint: &Endpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.read_timeout())
            .connect_timeout(endpoint.connect_timeout())
            .build()
            .map_err(|e| LightClientError::Configuration(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: endpoint.base_url().to_string(),
        })
    }
}

#[async_trait]
impl FullNodeTransport for HttpTransport {
    async fn get_json(&self, path: &str) -> std::result::Result<serde_json::Value, NetworkCause> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client.get(&url).send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(NetworkCause::Status(status.as_u16()));
        }
        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    classify(e)
                } else {
                    NetworkCause::MalformedPayload(e.to_string())
                }
            })
    }
}

fn classify(e: reqwest::Error) -> NetworkCause {
    if e.is_timeout() {
        NetworkCause::Timeout(Duration::ZERO)
    } else {
        NetworkCause::Unreachable(e.to_string())
    }
}

/// Default connector: one reqwest client per endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn FullNodeTransport>> {
        Ok(Arc::new(HttpTransport::new(endpoint)?))
    }
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: Amount,
}

#[derive(Debug, Deserialize)]
struct DividendResponse {
    daily_dividend: Amount,
}

/// Raw selection status as reported by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SelectionStatus {
    pub selected: bool,
    /// Consensus round the answer refers to, when the node reports it.
    #[serde(default)]
    pub round: Option<u64>,
}

/// Typed lookups with a bounded timeout each.
pub struct NetworkClient {
    transport: Arc<dyn FullNodeTransport>,
    read_timeout: Duration,
}

impl NetworkClient {
    pub fn new(transport: Arc<dyn FullNodeTransport>, read_timeout: Duration) -> Self {
        Self {
            transport,
            read_timeout,
        }
    }

    pub async fn fetch_balance(&self, address: &str) -> Result<Amount> {
        let path = format!("/blockchain/balance/{}", address);
        let body: BalanceResponse = self.fetch(FetchKind::Balance, &path).await?;
        Ok(body.balance)
    }

    pub async fn fetch_daily_dividend(&self, address: &str) -> Result<Amount> {
        let path = format!("/du/daily/{}", address);
        let body: DividendResponse = self.fetch(FetchKind::DailyDividend, &path).await?;
        Ok(body.daily_dividend)
    }

    pub async fn fetch_validator_selection(&self, address: &str) -> Result<SelectionStatus> {
        let path = format!("/consensus/validator/{}", address);
        self.fetch(FetchKind::ValidatorSelection, &path).await
    }

    async fn fetch<T: DeserializeOwned>(&self, op: FetchKind, path: &str) -> Result<T> {
        let value = match tokio::time::timeout(self.read_timeout, self.transport.get_json(path)).await
        {
            Ok(Ok(value)) => value,
            Ok(Err(NetworkCause::Timeout(_))) | Err(_) => {
                return Err(LightClientError::network(
                    op,
                    NetworkCause::Timeout(self.read_timeout),
                ))
            }
            Ok(Err(cause)) => return Err(LightClientError::network(op, cause)),
        };

        serde_json::from_value(value).map_err(|e| {
            LightClientError::network(op, NetworkCause::MalformedPayload(e.to_string()))
        })
    }
}
