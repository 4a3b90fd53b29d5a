//! Scripted in-memory full node for unit tests.

use crate::config::Endpoint;
use crate::error::{NetworkCause, Result};
use crate::network::{Connector, FullNodeTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
struct Route {
    reply: std::result::Result<Value, NetworkCause>,
    delay: Option<Duration>,
}

#[derive(Default)]
pub struct MockNode {
    routes: Mutex<HashMap<String, Route>>,
    hits: Mutex<HashMap<String, usize>>,
}

impl MockNode {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Node answering all three lookups for `address`.
    pub fn healthy(address: &str, balance: &str, dividend: &str, selected: bool) -> Arc<Self> {
        let node = Self::new();
        node.set_state(address, balance, dividend, selected);
        node
    }

    pub fn set_state(&self, address: &str, balance: &str, dividend: &str, selected: bool) {
        let number = |s: &str| json!(s.parse::<f64>().unwrap());
        self.respond(
            &format!("/blockchain/balance/{}", address),
            json!({ "address": address, "balance": number(balance) }),
        );
        self.respond(
            &format!("/du/daily/{}", address),
            json!({ "address": address, "daily_dividend": number(dividend) }),
        );
        self.respond(
            &format!("/consensus/validator/{}", address),
            json!({ "address": address, "selected": selected, "round": 1 }),
        );
    }

    pub fn respond(&self, path: &str, body: Value) {
        self.set_reply(path, Ok(body));
    }

    pub fn fail(&self, path: &str, cause: NetworkCause) {
        self.set_reply(path, Err(cause));
    }

    pub fn delay(&self, path: &str, delay: Duration) {
        let mut routes = self.routes.lock().unwrap();
        let route = routes.entry(path.to_string()).or_insert(Route {
            reply: Err(NetworkCause::Status(404)),
            delay: None,
        });
        route.delay = Some(delay);
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.hits.lock().unwrap().values().sum()
    }

    fn set_reply(&self, path: &str, reply: std::result::Result<Value, NetworkCause>) {
        let mut routes = self.routes.lock().unwrap();
        let delay = routes.get(path).and_then(|r| r.delay);
        routes.insert(path.to_string(), Route { reply, delay });
    }
}

#[async_trait]
impl FullNodeTransport for MockNode {
    async fn get_json(&self, path: &str) -> std::result::Result<Value, NetworkCause> {
        *self.hits.lock().unwrap().entry(path.to_string()).or_default() += 1;
        let route = self
            .routes
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or(Route {
                reply: Err(NetworkCause::Status(404)),
                delay: None,
            });
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        route.reply
    }
}

/// Connector handing out the same mock node for any endpoint, recording which
/// endpoints were requested.
pub struct MockConnector {
    pub node: Arc<MockNode>,
    pub connected: Mutex<Vec<String>>,
}

impl MockConnector {
    pub fn new(node: Arc<MockNode>) -> Self {
        Self {
            node,
            connected: Mutex::new(Vec::new()),
        }
    }
}

impl Connector for MockConnector {
    fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn FullNodeTransport>> {
        self.connected
            .lock()
            .unwrap()
            .push(endpoint.base_url().to_string());
        Ok(self.node.clone())
    }
}
