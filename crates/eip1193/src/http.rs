use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    time::Duration,
};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    error::ProviderError,
    protocol::{JsonRpcRequest, JsonRpcResponse},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url::Url;

use crate::transport::Eip1193Transport;

const MIN_CHAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// JSON-RPC over HTTP to a node that manages its own accounts (anvil, geth
/// `--dev`). Nodes never push `chainChanged`, so [`HttpTransport::watch_chain`]
/// polls `eth_chainId` and emits on change.
pub struct HttpTransport {
    http: Client,
    url: Url,
    next_id: AtomicU64,
    chain_changed: broadcast::Sender<String>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl HttpTransport {
    pub fn new(rpc_url: &str) -> Result<Self, ProviderError> {
        let url = Url::parse(rpc_url)
            .map_err(|err| ProviderError::transport(format!("invalid RPC url '{rpc_url}': {err}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderError::transport(format!(
                "unsupported RPC url scheme '{}'",
                url.scheme()
            )));
        }
        let (chain_changed, _) = broadcast::channel(16);
        Ok(Self {
            http: Client::new(),
            url,
            next_id: AtomicU64::new(1),
            chain_changed,
            watcher: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Starts polling the node's chain id. A second call is a no-op while the
    /// first watcher runs. The task stops once the transport is dropped.
    pub async fn watch_chain(self: &Arc<Self>, interval: Duration) {
        if interval < MIN_CHAIN_POLL_INTERVAL {
            warn!("rpc: chain poll interval {interval:?} raised to {MIN_CHAIN_POLL_INTERVAL:?}");
        }
        let interval = interval.max(MIN_CHAIN_POLL_INTERVAL);
        let mut watcher = self.watcher.lock().await;
        if watcher.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }
        *watcher = Some(tokio::spawn(poll_chain_id(Arc::downgrade(self), interval)));
        info!(url = %self.url, "rpc: watching chain id every {interval:?}");
    }

    pub async fn stop_watching(&self) {
        if let Some(task) = self.watcher.lock().await.take() {
            task.abort();
        }
    }
}

#[async_trait]
impl Eip1193Transport for HttpTransport {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, method, "rpc: request");
        let response = self
            .http
            .post(self.url.clone())
            .json(&JsonRpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(|err| ProviderError::transport(format!("{method}: {err}")))?;

        let status = response.status();
        let body: JsonRpcResponse = response.json().await.map_err(|err| {
            ProviderError::transport(format!("{method}: undecodable response ({status}): {err}"))
        })?;
        if body.id.is_some_and(|echoed| echoed != id) {
            warn!(id, echoed = ?body.id, method, "rpc: response id mismatch");
        }
        body.into_result()
    }

    fn chain_changed(&self) -> broadcast::Receiver<String> {
        self.chain_changed.subscribe()
    }
}

async fn poll_chain_id(transport: Weak<HttpTransport>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last: Option<String> = None;

    loop {
        ticker.tick().await;
        let Some(transport) = transport.upgrade() else {
            break;
        };
        let current = match transport.request("eth_chainId", Value::Array(Vec::new())).await {
            Ok(Value::String(chain_id)) => chain_id.to_ascii_lowercase(),
            Ok(other) => {
                warn!(result = %other, "rpc: eth_chainId returned a non-string result");
                continue;
            }
            Err(err) => {
                warn!("rpc: chain id poll failed: {err}");
                continue;
            }
        };

        if last.as_deref().is_some_and(|previous| previous != current) {
            info!(chain_id = %current, "rpc: node chain id changed");
            let _ = transport.chain_changed.send(current.clone());
        }
        last = Some(current);
    }
    debug!("rpc: chain id watcher stopped");
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
