//! Capability seams between the orchestration core and the injected wallet.
//!
//! Everything the core needs from the outside world goes through these traits,
//! so the session, network and transfer logic can run against a browser wallet,
//! an HTTP node or an in-memory fake.

use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use shared::{
    domain::ChainId,
    error::{ProviderError, ProviderErrorKind},
    protocol::{AddChainParams, TransactionReceipt, TransactionRequest},
};
use tokio::sync::broadcast;

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Whether a wallet is injected at all. Checked before any request.
    fn is_available(&self) -> bool;
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;
    async fn signer(&self) -> Result<Arc<dyn WalletSigner>, ProviderError>;
    async fn balance(&self, account: Address) -> Result<U256, ProviderError>;
    async fn chain_id(&self) -> Result<ChainId, ProviderError>;
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;
    async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderError>;
    /// Raw `chainChanged` payloads, hex encoded (`"0xaa36a7"`).
    fn subscribe_chain_changed(&self) -> broadcast::Receiver<String>;
}

#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn address(&self) -> Address;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ProviderError>;
}

pub trait ContractConnector: Send + Sync {
    fn connect(&self, address: Address, signer: Arc<dyn WalletSigner>) -> Arc<dyn VaultContract>;
}

#[async_trait]
pub trait VaultContract: Send + Sync {
    fn address(&self) -> Address;
    /// `transferFunds(recipient, amount)` with `value` attached.
    async fn transfer_funds(
        &self,
        recipient: Address,
        amount: U256,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>, ProviderError>;
}

#[async_trait]
pub trait PendingTransaction: Send + Sync {
    fn hash(&self) -> B256;
    /// Resolves once the transaction is mined. Never times out.
    async fn wait(&self) -> Result<TransactionReceipt, ProviderError>;
}

pub struct MissingWalletProvider;

impl MissingWalletProvider {
    fn unavailable() -> ProviderError {
        ProviderError::new(ProviderErrorKind::Disconnected, "no wallet provider injected")
    }
}

#[async_trait]
impl WalletProvider for MissingWalletProvider {
    fn is_available(&self) -> bool {
        false
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Err(Self::unavailable())
    }

    async fn signer(&self) -> Result<Arc<dyn WalletSigner>, ProviderError> {
        Err(Self::unavailable())
    }

    async fn balance(&self, _account: Address) -> Result<U256, ProviderError> {
        Err(Self::unavailable())
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        Err(Self::unavailable())
    }

    async fn switch_chain(&self, _chain_id: ChainId) -> Result<(), ProviderError> {
        Err(Self::unavailable())
    }

    async fn add_chain(&self, _params: AddChainParams) -> Result<(), ProviderError> {
        Err(Self::unavailable())
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<String> {
        let (_, rx) = broadcast::channel(1);
        rx
    }
}
