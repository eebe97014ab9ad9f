//! Minimal JSON-RPC node served by axum for the transport tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use axum::{extract::State, routing::post, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use wallet_core::notify::{Notification, Notifier};

pub fn account() -> Address {
    Address::repeat_byte(0xaa)
}

pub fn tx_hash() -> B256 {
    B256::repeat_byte(0x42)
}

pub fn ether(whole: u64) -> U256 {
    U256::from(whole) * U256::from(1_000_000_000_000_000_000u64)
}

pub struct NodeState {
    pub chain_id: u64,
    pub known_chains: Vec<u64>,
    pub accounts: Vec<Address>,
    pub balances: HashMap<Address, U256>,
    /// `eth_getTransactionReceipt` answers `null` this many times first.
    pub pending_polls: usize,
    pub receipt_status: u64,
    pub methods: Vec<String>,
    pub sent: Vec<Value>,
    pub added: Vec<Value>,
}

impl NodeState {
    fn new(chain_id: u64) -> Self {
        let mut balances = HashMap::new();
        balances.insert(account(), ether(3));
        Self {
            chain_id,
            known_chains: vec![1, chain_id],
            accounts: vec![account()],
            balances,
            pending_polls: 0,
            receipt_status: 1,
            methods: Vec::new(),
            sent: Vec::new(),
            added: Vec::new(),
        }
    }

    fn count(&self, method: &str) -> usize {
        self.methods.iter().filter(|m| m.as_str() == method).count()
    }
}

#[derive(Clone)]
pub struct MockNode {
    pub url: String,
    pub state: Arc<Mutex<NodeState>>,
}

impl MockNode {
    pub fn with<R>(&self, f: impl FnOnce(&mut NodeState) -> R) -> R {
        let mut state = self.state.lock().expect("lock");
        f(&mut state)
    }

    pub fn count(&self, method: &str) -> usize {
        self.with(|state| state.count(method))
    }
}

pub async fn spawn_mock_node(chain_id: u64) -> MockNode {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = Arc::new(Mutex::new(NodeState::new(chain_id)));
    let app = Router::new()
        .route("/", post(handle_rpc))
        .with_state(Arc::clone(&state));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    MockNode {
        url: format!("http://{addr}/"),
        state,
    }
}

fn ok(id: &Value, result: Value) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    }))
}

fn chain_hex(chain_id: u64) -> String {
    format!("{chain_id:#x}")
}

fn param_chain_id(params: &Value) -> Option<u64> {
    let raw = params.get(0)?.get("chainId")?.as_str()?;
    u64::from_str_radix(raw.trim_start_matches("0x"), 16).ok()
}

async fn handle_rpc(
    State(state): State<Arc<Mutex<NodeState>>>,
    Json(request): Json<Value>,
) -> Json<Value> {
    let id = request.get("id").cloned().unwrap_or(Value::Null);
    let method = request
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let params = request.get("params").cloned().unwrap_or(Value::Null);

    let mut node = state.lock().expect("lock");
    node.methods.push(method.clone());
    match method.as_str() {
        "eth_chainId" => ok(&id, json!(chain_hex(node.chain_id))),
        "eth_requestAccounts" | "eth_accounts" => ok(&id, json!(node.accounts)),
        "eth_getBalance" => {
            let account: Address = serde_json::from_value(params[0].clone()).expect("address");
            let balance = node.balances.get(&account).copied().unwrap_or_default();
            ok(&id, json!(balance))
        }
        "wallet_switchEthereumChain" => match param_chain_id(&params) {
            Some(chain) if node.known_chains.contains(&chain) => {
                node.chain_id = chain;
                ok(&id, Value::Null)
            }
            Some(_) => rpc_error(&id, 4902, "Unrecognized chain ID"),
            None => rpc_error(&id, -32602, "invalid params"),
        },
        "wallet_addEthereumChain" => match param_chain_id(&params) {
            Some(chain) => {
                node.added.push(params[0].clone());
                node.known_chains.push(chain);
                node.chain_id = chain;
                ok(&id, Value::Null)
            }
            None => rpc_error(&id, -32602, "invalid params"),
        },
        "eth_sendTransaction" => {
            let tx = params[0].clone();
            node.sent.push(tx.clone());
            let from: Address = serde_json::from_value(tx["from"].clone()).expect("from");
            let value: U256 = serde_json::from_value(tx["value"].clone()).expect("value");
            let balance = node.balances.entry(from).or_default();
            *balance = balance.saturating_sub(value);
            ok(&id, json!(tx_hash()))
        }
        "eth_getTransactionReceipt" => {
            if node.pending_polls > 0 {
                node.pending_polls -= 1;
                return ok(&id, Value::Null);
            }
            ok(
                &id,
                json!({
                    "transactionHash": params[0],
                    "blockNumber": "0x1",
                    "status": format!("{:#x}", node.receipt_status),
                }),
            )
        }
        _ => rpc_error(&id, -32601, "Method not found"),
    }
}

/// Accepts every prompt.
pub struct AcceptingNotifier;

#[async_trait]
impl Notifier for AcceptingNotifier {
    async fn inform(&self, _notification: Notification) {}

    async fn confirm(&self, _notification: Notification) -> bool {
        true
    }
}
