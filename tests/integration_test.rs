// ========================================
// INTEGRATION TESTS FOR THE MAHALA LIGHT CLIENT
// ========================================
//
// Runs the light client over real HTTP against an in-process warp full node.
//
// Test Scenarios:
// 1. Biometric wallet: derive, sync, re-derive
// 2. Overlapping syncs share one round trip per lookup
// 3. Dividend timeout keeps the previous snapshot
// 4. Node error statuses and unreachable nodes
// 5. Validator selection events
// 6. Blocking wrapper
//
// Usage:
//   cargo test --test integration_test -- --nocapture
//
// ========================================

use mahala_light::{
    Amount, BlockingLightClient, FetchKind, LightClient, LightClientConfig, LightClientError,
    NetworkCause, ValidatorEvent,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use warp::http::StatusCode;
use warp::Filter;

// ========================================
// MOCK FULL NODE
// ========================================

#[derive(Default)]
struct NodeState {
    balances: HashMap<String, f64>,
    dividends: HashMap<String, f64>,
    selected: HashMap<String, bool>,
    round: u64,
    delays: HashMap<&'static str, Duration>,
    failures: HashMap<&'static str, u16>,
    hits: HashMap<&'static str, usize>,
}

#[derive(Clone, Default)]
struct MockFullNode {
    state: Arc<Mutex<NodeState>>,
}

impl MockFullNode {
    fn set_account(&self, address: &str, balance: f64, dividend: f64, selected: bool) {
        let mut s = self.state.lock().unwrap();
        s.balances.insert(address.to_string(), balance);
        s.dividends.insert(address.to_string(), dividend);
        s.selected.insert(address.to_string(), selected);
    }

    fn delay(&self, route: &'static str, delay: Duration) {
        self.state.lock().unwrap().delays.insert(route, delay);
    }

    fn fail(&self, route: &'static str, status: u16) {
        self.state.lock().unwrap().failures.insert(route, status);
    }

    fn hits(&self, route: &'static str) -> usize {
        self.state.lock().unwrap().hits.get(route).copied().unwrap_or(0)
    }

    /// Count the hit, then return the configured delay and the reply for `route`.
    fn answer(&self, route: &'static str, address: &str) -> (Option<Duration>, StatusCode, Value) {
        let mut s = self.state.lock().unwrap();
        *s.hits.entry(route).or_default() += 1;
        let delay = s.delays.get(route).copied();
        if let Some(code) = s.failures.get(route) {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return (delay, status, json!({ "status": "error" }));
        }
        s.round += 1;
        let body = match route {
            "balance" => json!({
                "address": address,
                "balance": s.balances.get(address).copied().unwrap_or(0.0),
            }),
            "dividend" => json!({
                "address": address,
                "daily_dividend": s.dividends.get(address).copied().unwrap_or(0.0),
            }),
            _ => json!({
                "address": address,
                "selected": s.selected.get(address).copied().unwrap_or(false),
                "round": s.round,
            }),
        };
        (delay, StatusCode::OK, body)
    }
}

fn with_node(
    node: MockFullNode,
) -> impl Filter<Extract = (MockFullNode,), Error = Infallible> + Clone {
    warp::any().map(move || node.clone())
}

async fn respond(
    route: &'static str,
    address: String,
    node: MockFullNode,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    let (delay, status, body) = node.answer(route, &address);
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Ok(warp::reply::with_status(warp::reply::json(&body), status))
}

/// Serve the mock node on an ephemeral port of the current runtime.
fn start_node(node: MockFullNode) -> String {
    let balance = warp::path!("blockchain" / "balance" / String)
        .and(warp::get())
        .and(with_node(node.clone()))
        .and_then(|address, node| respond("balance", address, node));
    let dividend = warp::path!("du" / "daily" / String)
        .and(warp::get())
        .and(with_node(node.clone()))
        .and_then(|address, node| respond("dividend", address, node));
    let validator = warp::path!("consensus" / "validator" / String)
        .and(warp::get())
        .and(with_node(node))
        .and_then(|address, node| respond("validator", address, node));

    let routes = balance.or(dividend).or(validator);
    let (addr, server): (SocketAddr, _) =
        warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{}", addr)
}

fn device_fingerprint() -> String {
    mahala_crypto::fingerprint_hex_from_device("device123", "saltABC")
}

fn device_address() -> String {
    mahala_crypto::derive_identity(&device_fingerprint())
        .unwrap()
        .address()
        .to_string()
}

fn amt(s: &str) -> Amount {
    s.parse().unwrap()
}

async fn ready_client(node: &MockFullNode, read_timeout_ms: u64) -> LightClient {
    let url = start_node(node.clone());
    let client = LightClient::new();
    client
        .initialize_with(LightClientConfig {
            full_node_url: url,
            read_timeout_ms,
            connect_timeout_ms: 1_000,
        })
        .unwrap();
    client.derive_wallet(&device_fingerprint()).unwrap();
    client
}

// ========================================
// TEST 1: BIOMETRIC WALLET LIFECYCLE
// ========================================
#[tokio::test]
async fn test_biometric_wallet_sync_and_recovery() {
    println!("\n🧪 TEST 1: Biometric wallet lifecycle");

    let node = MockFullNode::default();
    let address = device_address();
    node.set_account(&address, 120.5, 0.0340, false);
    let url = start_node(node.clone());

    let client = LightClient::new();
    client.initialize(&url).unwrap();
    let derived = client.derive_wallet(&device_fingerprint()).unwrap();
    assert_eq!(derived, address);
    assert_eq!(client.get_balance(), Err(LightClientError::NotSynced));

    client.sync().await.unwrap();
    assert_eq!(client.get_balance().unwrap(), amt("120.5"));
    assert_eq!(client.get_daily_dividend().unwrap(), amt("0.0340"));

    // Same device, same salt: same wallet, state kept.
    assert_eq!(client.derive_wallet(&device_fingerprint()).unwrap(), address);
    assert_eq!(client.get_balance().unwrap(), amt("120.5"));

    // A fresh engine recovers the same address from the same fingerprint.
    let recovered = LightClient::new();
    recovered.initialize(&url).unwrap();
    assert_eq!(recovered.derive_wallet(&device_fingerprint()).unwrap(), address);

    println!("✅ Address {} recovered", address);
}

// ========================================
// TEST 2: OVERLAPPING SYNCS
// ========================================
#[tokio::test]
async fn test_overlapping_syncs_share_round_trips() {
    println!("\n🧪 TEST 2: Overlapping syncs");

    let node = MockFullNode::default();
    node.set_account(&device_address(), 10.0, 1.0, false);
    node.delay("balance", Duration::from_millis(200));
    let client = ready_client(&node, 2_000).await;

    let (a, b, c) = tokio::join!(client.sync(), client.sync(), client.sync());

    let a = a.unwrap();
    assert_eq!(Ok(a.clone()), b);
    assert_eq!(Ok(a), c);
    for route in ["balance", "dividend", "validator"] {
        assert_eq!(node.hits(route), 1, "{} fetched more than once", route);
    }
    assert!(!client.is_sync_in_flight());

    println!("✅ Three callers, one round trip per lookup");
}

// ========================================
// TEST 3: DIVIDEND TIMEOUT
// ========================================
#[tokio::test]
async fn test_dividend_timeout_keeps_previous_snapshot() {
    println!("\n🧪 TEST 3: Dividend timeout");

    let node = MockFullNode::default();
    let address = device_address();
    node.set_account(&address, 120.5, 0.0340, false);
    let client = ready_client(&node, 300).await;
    client.sync().await.unwrap();
    let before = client.sync_status().snapshot;

    node.set_account(&address, 999.0, 9.0, false);
    node.delay("dividend", Duration::from_secs(2));
    let err = client.sync().await.unwrap_err();

    assert!(matches!(
        err,
        LightClientError::Network {
            op: FetchKind::DailyDividend,
            cause: NetworkCause::Timeout(_)
        }
    ));
    assert_eq!(client.get_balance().unwrap(), amt("120.5"));
    let status = client.sync_status();
    assert_eq!(status.snapshot, before);
    assert!(status.is_stale());

    println!("✅ Snapshot unchanged after timeout");
}

// ========================================
// TEST 4: NODE FAILURES
// ========================================
#[tokio::test]
async fn test_error_status_is_network_error() {
    let node = MockFullNode::default();
    node.set_account(&device_address(), 1.0, 1.0, false);
    node.fail("validator", 500);
    let client = ready_client(&node, 2_000).await;

    let err = client.sync().await.unwrap_err();

    assert_eq!(
        err,
        LightClientError::Network {
            op: FetchKind::ValidatorSelection,
            cause: NetworkCause::Status(500)
        }
    );
    assert_eq!(client.get_balance(), Err(LightClientError::NotSynced));
}

#[tokio::test]
async fn test_unknown_route_is_network_error() {
    let node = MockFullNode::default();
    let url = start_node(node);
    let client = LightClient::new();
    client.initialize(&format!("{}/v2", url)).unwrap();
    client.derive_wallet(&device_fingerprint()).unwrap();

    let err = client.check_validator_selection().await.unwrap_err();
    assert_eq!(
        err,
        LightClientError::Network {
            op: FetchKind::ValidatorSelection,
            cause: NetworkCause::Status(404)
        }
    );
}

#[tokio::test]
async fn test_unreachable_node() {
    let client = LightClient::new();
    client
        .initialize_with(LightClientConfig {
            full_node_url: "http://127.0.0.1:9".to_string(),
            read_timeout_ms: 1_000,
            connect_timeout_ms: 500,
        })
        .unwrap();
    client.derive_wallet(&device_fingerprint()).unwrap();

    let err = client.sync().await.unwrap_err();

    assert!(matches!(err, LightClientError::Network { .. }), "{:?}", err);
    assert!(!client.is_sync_in_flight());
}

// ========================================
// TEST 5: VALIDATOR SELECTION
// ========================================
#[tokio::test]
async fn test_validator_selection_event() {
    println!("\n🧪 TEST 5: Validator selection");

    let node = MockFullNode::default();
    let address = device_address();
    node.set_account(&address, 1.0, 1.0, true);
    let client = ready_client(&node, 2_000).await;
    let mut events = client.subscribe_validator_events();

    assert!(client.check_validator_selection().await.unwrap());

    match events.recv().await.unwrap() {
        ValidatorEvent::Selected { address: who, round, .. } => {
            assert_eq!(who, address);
            assert!(round.is_some());
        }
    }

    node.set_account(&address, 1.0, 1.0, false);
    assert!(!client.check_validator_selection().await.unwrap());
    let stats = client.validator_stats();
    assert_eq!(stats.polls, 2);
    assert_eq!(stats.times_selected, 1);

    println!("✅ Selection reported and counted");
}

// ========================================
// TEST 6: BLOCKING WRAPPER
// ========================================
#[test]
fn test_blocking_client_over_http() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let node = MockFullNode::default();
    let address = device_address();
    node.set_account(&address, 42.0, 0.5, false);
    let url = runtime.block_on(async { start_node(node.clone()) });

    let client = BlockingLightClient::new().unwrap();
    client.initialize(&url).unwrap();
    assert_eq!(client.derive_wallet(&device_fingerprint()).unwrap(), address);
    client.sync().unwrap();

    assert_eq!(client.get_balance().unwrap(), amt("42"));
    assert_eq!(client.get_daily_dividend().unwrap(), amt("0.5"));
    assert!(!client.check_validator_selection().unwrap());

    drop(client);
    drop(runtime);
}
