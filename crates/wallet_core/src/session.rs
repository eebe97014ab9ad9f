//! Wallet connection lifecycle.
//!
//! [`WalletSession`] is the only writer of session state. Other components read
//! [`Session`] snapshots and ask for a reconnect or balance refresh when they
//! need fresh data.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
};

use alloy_primitives::{Address, U256};
use shared::{
    domain::{ChainId, EthAmount},
    error::WalletError,
};
use tokio::{
    sync::{broadcast, Mutex, RwLock},
    task::JoinHandle,
};
use tokio_stream::{wrappers::errors::BroadcastStreamRecvError, wrappers::BroadcastStream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::{
    notify::{Notification, Notifier},
    provider::{ContractConnector, VaultContract, WalletProvider, WalletSigner},
};

const CONNECT_FAILURE_TEXT: &str =
    "Could not connect to the wallet. Make sure a wallet is installed and authorized.";

/// Connected wallet state. `signer` and `contract` are present iff `account` is.
#[derive(Clone)]
pub struct Session {
    pub account: Option<Address>,
    pub balance_wei: U256,
    /// Ether, four decimals.
    pub balance: String,
    pub network: ChainId,
    pub signer: Option<Arc<dyn WalletSigner>>,
    pub contract: Option<Arc<dyn VaultContract>>,
    /// Bumped on every committed reconnect.
    pub generation: u64,
}

impl Session {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            account: self.account,
            balance_wei: self.balance_wei,
            balance: self.balance.clone(),
            network: self.network,
            has_contract: self.contract.is_some(),
            generation: self.generation,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("account", &self.account)
            .field("balance", &self.balance)
            .field("network", &self.network)
            .field("has_signer", &self.signer.is_some())
            .field("has_contract", &self.contract.is_some())
            .field("generation", &self.generation)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub account: Option<Address>,
    pub balance_wei: U256,
    pub balance: String,
    pub network: ChainId,
    pub has_contract: bool,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    SessionChanged(Option<SessionSnapshot>),
    ChainChanged(ChainId),
    TransactionMessage(String),
}

#[derive(Default)]
struct SessionState {
    session: Option<Session>,
    generation: u64,
    committed_attempt: u64,
    transaction_message: String,
}

pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    contracts: Arc<dyn ContractConnector>,
    notifier: Arc<dyn Notifier>,
    contract_address: Address,
    state: RwLock<SessionState>,
    attempts: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
    events: broadcast::Sender<WalletEvent>,
}

impl WalletSession {
    pub fn new(
        provider: Arc<dyn WalletProvider>,
        contracts: Arc<dyn ContractConnector>,
        notifier: Arc<dyn Notifier>,
        contract_address: Address,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            provider,
            contracts,
            notifier,
            contract_address,
            state: RwLock::new(SessionState::default()),
            attempts: AtomicU64::new(0),
            listener: Mutex::new(None),
            events,
        })
    }

    /// Startup availability probe. Only logs.
    pub fn detect(&self) -> bool {
        let available = self.provider.is_available();
        if available {
            info!("wallet: provider detected");
        } else {
            info!("wallet: no provider detected");
        }
        available
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }

    /// Cached state, no wallet round trip.
    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    pub async fn snapshot(&self) -> Option<SessionSnapshot> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(Session::snapshot)
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    pub async fn transaction_message(&self) -> String {
        self.state.read().await.transaction_message.clone()
    }

    pub async fn set_transaction_message(&self, message: impl Into<String>) {
        let message = message.into();
        self.state.write().await.transaction_message = message.clone();
        let _ = self.events.send(WalletEvent::TransactionMessage(message));
    }

    /// Requests account access and rebuilds the session from the wallet, then
    /// makes sure chain-change notifications are being followed.
    pub async fn connect(self: &Arc<Self>) -> Result<Session, WalletError> {
        match self.synchronize().await {
            Ok((session, committed)) => {
                if committed {
                    self.ensure_listener().await;
                }
                Ok(session)
            }
            Err(err) => {
                self.report_connect_failure(&err).await;
                Err(err)
            }
        }
    }

    pub async fn disconnect(&self) {
        if let Some(task) = self.listener.lock().await.take() {
            task.abort();
        }
        self.clear_session().await;
        info!("wallet: session disconnected");
    }

    /// Re-reads the balance of the connected account.
    pub async fn refresh_balance(&self) -> Result<String, WalletError> {
        let Some(account) = self
            .state
            .read()
            .await
            .session
            .as_ref()
            .and_then(|session| session.account)
        else {
            warn!("wallet: balance refresh skipped, provider or account unavailable");
            return Err(WalletError::AccountUnavailable);
        };

        let balance_wei = self.provider.balance(account).await?;
        let balance = EthAmount::from_wei(balance_wei).to_display_4dp();

        let snapshot = {
            let mut state = self.state.write().await;
            match state.session.as_mut() {
                Some(session) if session.account == Some(account) => {
                    session.balance_wei = balance_wei;
                    session.balance = balance.clone();
                    Some(session.snapshot())
                }
                _ => None,
            }
        };
        if let Some(snapshot) = snapshot {
            debug!(account = %account, balance = %balance, "wallet: balance refreshed");
            let _ = self.events.send(WalletEvent::SessionChanged(Some(snapshot)));
        }
        Ok(balance)
    }

    /// Derives every session field from the wallet. Nothing is written unless
    /// all reads succeed, except that an empty account list clears the session.
    /// The flag is false when a later commit or a reset superseded this attempt.
    async fn synchronize(&self) -> Result<(Session, bool), WalletError> {
        if !self.provider.is_available() {
            return Err(WalletError::WalletUnavailable);
        }
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let accounts = self.provider.request_accounts().await?;
        if accounts.is_empty() {
            self.clear_session().await;
            return Err(WalletError::AccountUnavailable);
        }

        let signer = self.provider.signer().await?;
        let account = signer.address();
        info!(account = %account, "wallet: connected address");

        let balance_wei = self.provider.balance(account).await?;
        let network = self.provider.chain_id().await?;
        info!(chain_id = %network, "wallet: current network");

        let contract = self
            .contracts
            .connect(self.contract_address, Arc::clone(&signer));

        let (session, changed) = {
            let mut state = self.state.write().await;
            if attempt <= state.committed_attempt {
                // A later reconnect committed, or the session was reset meanwhile.
                match state.session.clone() {
                    Some(current) => (current, false),
                    None => return Err(WalletError::AccountUnavailable),
                }
            } else {
                state.committed_attempt = attempt;
                state.generation += 1;
                let session = Session {
                    account: Some(account),
                    balance_wei,
                    balance: EthAmount::from_wei(balance_wei).to_display_4dp(),
                    network,
                    signer: Some(signer),
                    contract: Some(contract),
                    generation: state.generation,
                };
                state.session = Some(session.clone());
                (session, true)
            }
        };

        if changed {
            let _ = self
                .events
                .send(WalletEvent::SessionChanged(Some(session.snapshot())));
        }
        Ok((session, changed))
    }

    async fn ensure_listener(self: &Arc<Self>) {
        let mut listener = self.listener.lock().await;
        if listener.as_ref().is_some_and(|task| !task.is_finished()) {
            return;
        }

        let changes = BroadcastStream::new(self.provider.subscribe_chain_changed());
        let session = Arc::downgrade(self);
        *listener = Some(tokio::spawn(follow_chain_changes(session, changes)));
        debug!("wallet: chain change listener registered");
    }

    async fn handle_chain_changed(&self, raw_chain_id: Option<String>) {
        if let Some(raw) = raw_chain_id {
            match raw.parse::<ChainId>() {
                Ok(chain_id) => {
                    info!(chain_id = %chain_id, "wallet: network change detected");
                    {
                        let mut state = self.state.write().await;
                        if let Some(session) = state.session.as_mut() {
                            session.network = chain_id;
                        }
                    }
                    let _ = self.events.send(WalletEvent::ChainChanged(chain_id));
                }
                Err(err) => warn!(raw = %raw, "wallet: undecodable chain change payload: {err}"),
            }
        }

        if let Err(err) = self.synchronize().await {
            self.report_connect_failure(&err).await;
        }
    }

    /// Drops the session and retires every attempt started before the reset.
    async fn clear_session(&self) {
        let had_session = {
            let mut state = self.state.write().await;
            state.committed_attempt = self.attempts.load(Ordering::SeqCst);
            state.session.take().is_some()
        };
        if had_session {
            let _ = self.events.send(WalletEvent::SessionChanged(None));
        }
    }

    async fn report_connect_failure(&self, err: &WalletError) {
        error!("wallet: error connecting to wallet: {err}");
        self.notifier
            .inform(Notification::error("Error", CONNECT_FAILURE_TEXT))
            .await;
    }
}

async fn follow_chain_changes(session: Weak<WalletSession>, mut changes: BroadcastStream<String>) {
    while let Some(change) = changes.next().await {
        let raw = match change {
            Ok(raw) => Some(raw),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(skipped, "wallet: chain change notifications dropped; resynchronizing");
                None
            }
        };
        let Some(session) = session.upgrade() else {
            break;
        };
        session.handle_chain_changed(raw).await;
    }
    debug!("wallet: chain change listener stopped");
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
