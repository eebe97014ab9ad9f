use std::sync::Arc;

use shared::{
    chains::ChainRegistry,
    domain::ChainId,
    error::WalletError,
};
use tracing::debug;

use crate::{
    clipboard::{ClipboardService, ClipboardWriter},
    config::WalletSettings,
    network::NetworkCoordinator,
    notify::Notifier,
    provider::{ContractConnector, WalletProvider},
    session::{SessionSnapshot, WalletSession},
    transfer::{TransferForm, TransferOrchestrator, TransferOutcome, TransferRequest},
};

/// Host capabilities the wallet app is wired against.
pub struct WalletDeps {
    pub provider: Arc<dyn WalletProvider>,
    pub contracts: Arc<dyn ContractConnector>,
    pub notifier: Arc<dyn Notifier>,
    pub clipboard: Arc<dyn ClipboardWriter>,
}

/// Single-field update to the transfer form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEdit {
    Recipient(String),
    Amount(String),
    Network(ChainId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCommand {
    Connect,
    Disconnect,
    SwitchNetwork(ChainId),
    Transfer(TransferRequest),
    EditForm(FormEdit),
    SubmitForm,
    ToggleForm,
    CopyAddress,
    CopyText(String),
    RefreshBalance,
    Status,
}

impl WalletCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::SwitchNetwork(_) => "switch_network",
            Self::Transfer(_) => "transfer",
            Self::EditForm(_) => "edit_form",
            Self::SubmitForm => "submit_form",
            Self::ToggleForm => "toggle_form",
            Self::CopyAddress => "copy_address",
            Self::CopyText(_) => "copy_text",
            Self::RefreshBalance => "refresh_balance",
            Self::Status => "status",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStatus {
    pub wallet_available: bool,
    pub session: Option<SessionSnapshot>,
    pub selected_network: ChainId,
    pub network_name: String,
    pub transaction_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReport {
    Session(SessionSnapshot),
    Disconnected,
    Balance(String),
    Transfer(TransferOutcome),
    Form(TransferForm),
    FormVisible(bool),
    Copied,
    Status(AppStatus),
}

pub struct WalletApp {
    settings: WalletSettings,
    registry: Arc<ChainRegistry>,
    session: Arc<WalletSession>,
    network: NetworkCoordinator,
    transfers: TransferOrchestrator,
    clipboard: ClipboardService,
}

impl WalletApp {
    pub fn new(settings: WalletSettings, deps: WalletDeps) -> Self {
        let registry = Arc::new(settings.registry());
        let session = WalletSession::new(
            Arc::clone(&deps.provider),
            deps.contracts,
            Arc::clone(&deps.notifier),
            settings.contract_address,
        );
        let network = NetworkCoordinator::new(
            Arc::clone(&session),
            Arc::clone(&deps.provider),
            Arc::clone(&registry),
            Arc::clone(&deps.notifier),
            settings.fallback_rpc_url.clone(),
        )
        .with_initial_selection(settings.default_chain);
        let transfers = TransferOrchestrator::new(
            Arc::clone(&session),
            deps.provider,
            Arc::clone(&registry),
            Arc::clone(&deps.notifier),
            settings.transfer_disabled_chain,
        );
        let clipboard = ClipboardService::new(deps.clipboard, deps.notifier);

        Self {
            settings,
            registry,
            session,
            network,
            transfers,
            clipboard,
        }
    }

    pub fn settings(&self) -> &WalletSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn session(&self) -> &Arc<WalletSession> {
        &self.session
    }

    pub fn network(&self) -> &NetworkCoordinator {
        &self.network
    }

    pub fn transfers(&self) -> &TransferOrchestrator {
        &self.transfers
    }

    pub fn clipboard(&self) -> &ClipboardService {
        &self.clipboard
    }

    pub async fn status(&self) -> AppStatus {
        let session = self.session.snapshot().await;
        let selected_network = self.network.selected_network().await;
        let network_name = self.registry.display_name(
            session
                .as_ref()
                .map(|snapshot| snapshot.network)
                .unwrap_or(selected_network),
        );
        AppStatus {
            wallet_available: self.session.detect(),
            session,
            selected_network,
            network_name,
            transaction_message: self.session.transaction_message().await,
        }
    }

    pub async fn dispatch(&self, cmd: WalletCommand) -> Result<CommandReport, WalletError> {
        debug!(command = cmd.name(), "wallet app: handling command");
        match cmd {
            WalletCommand::Connect => {
                let session = self.session.connect().await?;
                self.network.sync_selection().await;
                Ok(CommandReport::Session(session.snapshot()))
            }
            WalletCommand::Disconnect => {
                self.session.disconnect().await;
                Ok(CommandReport::Disconnected)
            }
            WalletCommand::SwitchNetwork(target) => {
                let session = self.network.request_switch(target).await?;
                Ok(CommandReport::Session(session.snapshot()))
            }
            WalletCommand::Transfer(request) => Ok(CommandReport::Transfer(
                self.transfers.transfer(request).await,
            )),
            WalletCommand::EditForm(edit) => {
                let mut form = self.transfers.form().await;
                match edit {
                    FormEdit::Recipient(recipient) => form.recipient = recipient,
                    FormEdit::Amount(amount) => form.amount = amount,
                    FormEdit::Network(chain_id) => form.selected_network = chain_id,
                }
                self.transfers.set_form(form.clone()).await;
                Ok(CommandReport::Form(form))
            }
            WalletCommand::SubmitForm => {
                Ok(CommandReport::Transfer(self.transfers.submit_form().await))
            }
            WalletCommand::ToggleForm => {
                Ok(CommandReport::FormVisible(self.transfers.toggle_form().await))
            }
            WalletCommand::CopyAddress => {
                let address = format!("{:#x}", self.session.contract_address());
                self.clipboard.copy(&address).await?;
                Ok(CommandReport::Copied)
            }
            WalletCommand::CopyText(text) => {
                self.clipboard.copy(&text).await?;
                Ok(CommandReport::Copied)
            }
            WalletCommand::RefreshBalance => {
                Ok(CommandReport::Balance(self.session.refresh_balance().await?))
            }
            WalletCommand::Status => Ok(CommandReport::Status(self.status().await)),
        }
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
