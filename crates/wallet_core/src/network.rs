use std::sync::Arc;

use shared::{
    chains::ChainRegistry,
    domain::{ChainId, DEFAULT_CHAIN},
    error::WalletError,
    protocol::AddChainParams,
};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    notify::{Notification, Notifier},
    provider::WalletProvider,
    session::{Session, WalletSession},
};

/// Moves the wallet to the network the user picked.
///
/// The selector only records intent. After a rejected switch it still holds
/// the attempted chain; the session's `network` is what the wallet is on.
pub struct NetworkCoordinator {
    session: Arc<WalletSession>,
    provider: Arc<dyn WalletProvider>,
    registry: Arc<ChainRegistry>,
    notifier: Arc<dyn Notifier>,
    fallback_rpc_url: Option<String>,
    selected: RwLock<ChainId>,
}

impl NetworkCoordinator {
    pub fn new(
        session: Arc<WalletSession>,
        provider: Arc<dyn WalletProvider>,
        registry: Arc<ChainRegistry>,
        notifier: Arc<dyn Notifier>,
        fallback_rpc_url: Option<String>,
    ) -> Self {
        Self {
            session,
            provider,
            registry,
            notifier,
            fallback_rpc_url,
            selected: RwLock::new(DEFAULT_CHAIN),
        }
    }

    /// Initial selector value; mainnet unless configured otherwise.
    pub fn with_initial_selection(mut self, chain_id: ChainId) -> Self {
        self.selected = RwLock::new(chain_id);
        self
    }

    pub async fn selected_network(&self) -> ChainId {
        *self.selected.read().await
    }

    /// Mirrors the wallet's network into the selector, e.g. after connect.
    pub async fn sync_selection(&self) {
        if let Some(session) = self.session.session().await {
            *self.selected.write().await = session.network;
        }
    }

    pub async fn request_switch(&self, target: ChainId) -> Result<Session, WalletError> {
        *self.selected.write().await = target;

        if !self.provider.is_available() {
            self.report_switch_failure(target).await;
            return Err(WalletError::WalletUnavailable);
        }

        info!(chain_id = %target, "network: requesting switch");
        match self.provider.switch_chain(target).await {
            Ok(()) => self.session.connect().await,
            Err(err) if err.is_unrecognized_chain() => {
                info!(chain_id = %target, "network: chain unknown to wallet, adding it");
                self.add_and_reconnect(target).await
            }
            Err(err) => {
                error!(chain_id = %target, "network: error changing network: {err}");
                self.report_switch_failure(target).await;
                Err(err.into())
            }
        }
    }

    async fn add_and_reconnect(&self, target: ChainId) -> Result<Session, WalletError> {
        let params = match self.registry.get(target) {
            Some(info) => AddChainParams::from(info),
            None => match &self.fallback_rpc_url {
                Some(rpc_url) => AddChainParams::custom(target, rpc_url.clone()),
                None => {
                    warn!(chain_id = %target, "network: no RPC endpoint known for chain");
                    self.notifier
                        .inform(Notification::error(
                            "Unsupported network",
                            format!("Network {target} is not supported."),
                        ))
                        .await;
                    return Err(WalletError::UnsupportedChain(target));
                }
            },
        };

        match self.provider.add_chain(params).await {
            Ok(()) => self.session.connect().await,
            Err(err) => {
                error!(chain_id = %target, "network: error adding network: {err}");
                self.notifier
                    .inform(Notification::error(
                        "Error",
                        format!(
                            "Could not add {} to the wallet.",
                            self.registry.display_name(target)
                        ),
                    ))
                    .await;
                Err(err.into())
            }
        }
    }

    async fn report_switch_failure(&self, target: ChainId) {
        self.notifier
            .inform(Notification::error(
                "Error",
                format!("Error switching the network to {target}. Try again."),
            ))
            .await;
    }
}

#[cfg(test)]
#[path = "tests/network_tests.rs"]
mod tests;
