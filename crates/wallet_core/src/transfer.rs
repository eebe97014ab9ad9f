//! Value transfers through the vault contract.
//!
//! One call to [`TransferOrchestrator::transfer`] walks
//! `Validating -> ConfirmingIntent -> Submitting -> AwaitingConfirmation`
//! and ends in exactly one [`TransferOutcome`]. Nothing here retries.
//!
//! A chain-change reconnect may land while a transaction is pending. The
//! pending handle keeps the signer it was submitted with; the balance refresh
//! afterwards reads whatever session is current. This race is accepted and
//! only logged.

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use shared::{
    chains::ChainRegistry,
    domain::{
        parse_address, AddressParseError, AmountParseError, ChainId, ChainIdParseError,
        EthAmount, DEFAULT_CHAIN,
    },
    error::NetworkMismatchError,
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{
    notify::{Notification, Notifier},
    provider::WalletProvider,
    session::WalletSession,
};

const TRANSFER_FAILED_TEXT: &str = "Error during the transfer. Please review the details.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferRequestError {
    #[error("invalid recipient: {0}")]
    Recipient(#[from] AddressParseError),
    #[error("invalid amount: {0}")]
    Amount(#[from] AmountParseError),
    #[error("invalid network: {0}")]
    Chain(#[from] ChainIdParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub recipient: Address,
    pub amount: EthAmount,
    pub target_chain: ChainId,
}

impl TransferRequest {
    pub fn new(
        recipient: Address,
        amount: EthAmount,
        target_chain: ChainId,
    ) -> Result<Self, TransferRequestError> {
        if amount.is_zero() {
            return Err(AmountParseError::NotPositive.into());
        }
        Ok(Self {
            recipient,
            amount,
            target_chain,
        })
    }

    pub fn parse(
        recipient: &str,
        amount: &str,
        target_chain: &str,
    ) -> Result<Self, TransferRequestError> {
        Ok(Self {
            recipient: parse_address(recipient)?,
            amount: EthAmount::parse_positive(amount)?,
            target_chain: target_chain.parse()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NoContractHandle,
    TransferDisabledOnChain(ChainId),
    NetworkMismatch(NetworkMismatchError),
    UserCancelled,
    InvalidRequest(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success {
        amount: EthAmount,
        recipient: Address,
        tx_hash: B256,
    },
    Rejected {
        reason: RejectReason,
    },
    Failed {
        cause: String,
    },
}

impl TransferOutcome {
    fn rejected(reason: RejectReason) -> Self {
        Self::Rejected { reason }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPhase {
    Validating,
    ConfirmingIntent,
    Submitting,
    AwaitingConfirmation { tx_hash: B256 },
    Settled,
    Rejected,
    Failed,
}

/// Request-local form fields. Reset after a settled transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferForm {
    pub recipient: String,
    pub amount: String,
    pub selected_network: ChainId,
    pub visible: bool,
}

impl Default for TransferForm {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            amount: "0".into(),
            selected_network: DEFAULT_CHAIN,
            visible: false,
        }
    }
}

impl TransferForm {
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Clears the request fields; visibility is a view concern and stays.
    pub fn reset_fields(&mut self) {
        let visible = self.visible;
        *self = Self {
            visible,
            ..Self::default()
        };
    }

    pub fn to_request(&self) -> Result<TransferRequest, TransferRequestError> {
        Ok(TransferRequest {
            recipient: parse_address(&self.recipient)?,
            amount: EthAmount::parse_positive(&self.amount)?,
            target_chain: self.selected_network,
        })
    }
}

pub struct TransferOrchestrator {
    session: Arc<WalletSession>,
    provider: Arc<dyn WalletProvider>,
    registry: Arc<ChainRegistry>,
    notifier: Arc<dyn Notifier>,
    disabled_chain: ChainId,
    form: Mutex<TransferForm>,
    phases: broadcast::Sender<TransferPhase>,
}

impl TransferOrchestrator {
    pub fn new(
        session: Arc<WalletSession>,
        provider: Arc<dyn WalletProvider>,
        registry: Arc<ChainRegistry>,
        notifier: Arc<dyn Notifier>,
        disabled_chain: ChainId,
    ) -> Self {
        let (phases, _) = broadcast::channel(64);
        Self {
            session,
            provider,
            registry,
            notifier,
            disabled_chain,
            form: Mutex::new(TransferForm::default()),
            phases,
        }
    }

    pub fn subscribe_phases(&self) -> broadcast::Receiver<TransferPhase> {
        self.phases.subscribe()
    }

    pub async fn form(&self) -> TransferForm {
        self.form.lock().await.clone()
    }

    pub async fn set_form(&self, form: TransferForm) {
        *self.form.lock().await = form;
    }

    pub async fn toggle_form(&self) -> bool {
        let mut form = self.form.lock().await;
        form.toggle();
        form.visible
    }

    /// Builds a request from the form fields and runs it.
    pub async fn submit_form(&self) -> TransferOutcome {
        let request = self.form.lock().await.to_request();
        match request {
            Ok(request) => self.transfer(request).await,
            Err(err) => {
                self.enter(TransferPhase::Rejected);
                self.notifier
                    .inform(Notification::error("Invalid transfer", err.to_string()))
                    .await;
                TransferOutcome::rejected(RejectReason::InvalidRequest(err.to_string()))
            }
        }
    }

    pub async fn transfer(&self, request: TransferRequest) -> TransferOutcome {
        self.enter(TransferPhase::Validating);

        let Some(contract) = self
            .session
            .session()
            .await
            .and_then(|session| session.contract)
        else {
            error!("transfer: contract not loaded");
            self.notifier
                .inform(Notification::error(
                    "Error",
                    "Connect a wallet before sending funds.",
                ))
                .await;
            return self.reject(RejectReason::NoContractHandle);
        };

        if request.target_chain == self.disabled_chain {
            let message = format!(
                "Warning: the {} network is not supported for sending funds at this time.",
                self.registry.display_name(request.target_chain)
            );
            self.session.set_transaction_message(message.clone()).await;
            self.notifier
                .inform(Notification::warning("Warning", message))
                .await;
            return self.reject(RejectReason::TransferDisabledOnChain(request.target_chain));
        }

        let current = match self.provider.chain_id().await {
            Ok(current) => current,
            Err(err) => return self.fail(format!("could not read current network: {err}")).await,
        };
        if current != request.target_chain {
            let mismatch = NetworkMismatchError {
                current,
                requested: request.target_chain,
            };
            let message = format!(
                "Error: the current network is {current}, but you selected {}. Please switch networks.",
                request.target_chain
            );
            error!("transfer: {message}");
            self.session.set_transaction_message(message.clone()).await;
            self.notifier
                .inform(Notification::error("Wrong network", message))
                .await;
            return self.reject(RejectReason::NetworkMismatch(mismatch));
        }

        let symbol = self.currency_symbol(request.target_chain);
        self.enter(TransferPhase::ConfirmingIntent);
        let confirmed = self
            .notifier
            .confirm(Notification::question(
                "Are you sure?",
                format!(
                    "Do you want to send {} {symbol} to {}?",
                    request.amount, request.recipient
                ),
                "Yes, send",
                "Cancel",
            ))
            .await;
        if !confirmed {
            info!("transfer: cancelled by user");
            return self.reject(RejectReason::UserCancelled);
        }

        self.enter(TransferPhase::Submitting);
        let amount_wei = request.amount.wei();
        let generation = self.session.generation().await;
        let pending = match contract
            .transfer_funds(request.recipient, amount_wei, amount_wei)
            .await
        {
            Ok(pending) => pending,
            Err(err) => return self.fail(err.to_string()).await,
        };

        let tx_hash = pending.hash();
        info!(tx_hash = %tx_hash, "transfer: submitted, awaiting confirmation");
        self.enter(TransferPhase::AwaitingConfirmation { tx_hash });
        self.session
            .set_transaction_message(format!("Transaction {tx_hash} pending confirmation"))
            .await;
        if let Err(err) = pending.wait().await {
            return self.fail(err.to_string()).await;
        }

        if self.session.generation().await != generation {
            warn!(
                tx_hash = %tx_hash,
                "transfer: session reconnected while the transaction was pending"
            );
        }
        if let Err(err) = self.session.refresh_balance().await {
            error!("transfer: balance refresh after settlement failed: {err}");
        }

        let summary = format!("{} {symbol} sent to {}", request.amount, request.recipient);
        self.notifier
            .inform(Notification::success("Transaction successful", summary.clone()))
            .await;
        info!(
            amount = %request.amount,
            recipient = %request.recipient,
            "transfer: settled"
        );
        self.session
            .set_transaction_message(format!("Transaction successful: {summary}"))
            .await;
        self.form.lock().await.reset_fields();
        self.enter(TransferPhase::Settled);

        TransferOutcome::Success {
            amount: request.amount,
            recipient: request.recipient,
            tx_hash,
        }
    }

    fn currency_symbol(&self, chain_id: ChainId) -> String {
        self.registry
            .get(chain_id)
            .map(|info| info.native_currency.symbol.clone())
            .unwrap_or_else(|| "ETH".into())
    }

    fn enter(&self, phase: TransferPhase) {
        let _ = self.phases.send(phase);
    }

    fn reject(&self, reason: RejectReason) -> TransferOutcome {
        self.enter(TransferPhase::Rejected);
        TransferOutcome::rejected(reason)
    }

    async fn fail(&self, cause: String) -> TransferOutcome {
        error!("transfer: error transferring funds: {cause}");
        self.session
            .set_transaction_message(TRANSFER_FAILED_TEXT)
            .await;
        self.notifier
            .inform(Notification::error("Transfer failed", TRANSFER_FAILED_TEXT))
            .await;
        self.enter(TransferPhase::Failed);
        TransferOutcome::Failed { cause }
    }
}

#[cfg(test)]
#[path = "tests/transfer_tests.rs"]
mod tests;
