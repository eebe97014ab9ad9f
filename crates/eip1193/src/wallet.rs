use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde_json::{json, Value};
use shared::{
    domain::ChainId,
    error::{ProviderError, ProviderErrorKind},
    protocol::{AddChainParams, SwitchChainParams, TransactionRequest},
};
use tokio::sync::broadcast;
use tracing::debug;
use wallet_core::provider::{WalletProvider, WalletSigner};

use crate::transport::{request_as, Eip1193Transport};

/// [`WalletProvider`] over any EIP-1193 transport.
pub struct InjectedWallet<T> {
    transport: Arc<T>,
}

impl<T: Eip1193Transport> InjectedWallet<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }
}

#[async_trait]
impl<T: Eip1193Transport> WalletProvider for InjectedWallet<T> {
    fn is_available(&self) -> bool {
        self.transport.is_connected()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        request_as(self.transport.as_ref(), "eth_requestAccounts", json!([])).await
    }

    async fn signer(&self) -> Result<Arc<dyn WalletSigner>, ProviderError> {
        let accounts: Vec<Address> =
            request_as(self.transport.as_ref(), "eth_accounts", json!([])).await?;
        let address = accounts.first().copied().ok_or_else(|| {
            ProviderError::new(ProviderErrorKind::Unauthorized, "no authorized account")
        })?;
        Ok(Arc::new(TransportSigner {
            address,
            transport: Arc::clone(&self.transport),
        }))
    }

    async fn balance(&self, account: Address) -> Result<U256, ProviderError> {
        request_as(
            self.transport.as_ref(),
            "eth_getBalance",
            json!([account, "latest"]),
        )
        .await
    }

    async fn chain_id(&self) -> Result<ChainId, ProviderError> {
        let raw: String = request_as(self.transport.as_ref(), "eth_chainId", json!([])).await?;
        ChainId::from_hex(&raw)
            .map_err(|err| ProviderError::transport(format!("bad eth_chainId result: {err}")))
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        debug!(chain_id = %chain_id, "wallet: wallet_switchEthereumChain");
        self.transport
            .request(
                "wallet_switchEthereumChain",
                json!([SwitchChainParams::new(chain_id)]),
            )
            .await
            .map(drop)
    }

    async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderError> {
        debug!(chain_id = %params.chain_id, "wallet: wallet_addEthereumChain");
        self.transport
            .request("wallet_addEthereumChain", json!([params]))
            .await
            .map(drop)
    }

    fn subscribe_chain_changed(&self) -> broadcast::Receiver<String> {
        self.transport.chain_changed()
    }
}

/// Signs by handing `eth_sendTransaction` to the wallet.
pub struct TransportSigner<T> {
    address: Address,
    transport: Arc<T>,
}

#[async_trait]
impl<T: Eip1193Transport> WalletSigner for TransportSigner<T> {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256, ProviderError> {
        let params = Value::Array(vec![serde_json::to_value(&tx).map_err(|err| {
            ProviderError::transport(format!("unencodable transaction: {err}"))
        })?]);
        request_as(self.transport.as_ref(), "eth_sendTransaction", params).await
    }
}

#[cfg(test)]
#[path = "tests/wallet_tests.rs"]
mod tests;
