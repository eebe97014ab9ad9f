pub mod app;
pub mod clipboard;
pub mod config;
pub mod network;
pub mod notify;
pub mod provider;
pub mod session;
pub mod transfer;

#[cfg(test)]
#[path = "tests/fakes.rs"]
pub(crate) mod fakes;

pub use app::{AppStatus, CommandReport, FormEdit, WalletApp, WalletCommand, WalletDeps};
pub use clipboard::{ClipboardService, ClipboardWriter};
pub use config::{load_settings, SettingsError, WalletSettings};
pub use network::NetworkCoordinator;
pub use notify::{LogNotifier, Notification, NotificationIcon, Notifier};
pub use provider::{
    ContractConnector, MissingWalletProvider, PendingTransaction, VaultContract, WalletProvider,
    WalletSigner,
};
pub use session::{Session, SessionSnapshot, WalletEvent, WalletSession};
pub use transfer::{
    RejectReason, TransferForm, TransferOrchestrator, TransferOutcome, TransferPhase,
    TransferRequest, TransferRequestError,
};
