use std::{sync::Arc, time::Duration};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde_json::json;
use shared::{
    error::{ProviderError, ProviderErrorKind},
    protocol::{TransactionReceipt, TransactionRequest},
};
use tracing::{debug, info};
use wallet_core::provider::{ContractConnector, PendingTransaction, VaultContract, WalletSigner};

use crate::transport::{request_as, Eip1193Transport};

const TRANSFER_FUNDS_SIGNATURE: &str = "transferFunds(address,uint256)";

/// ABI encoding of `transferFunds(recipient, amount)`.
pub fn transfer_funds_calldata(recipient: Address, amount: U256) -> Bytes {
    let mut data = Vec::with_capacity(4 + 32 + 32);
    data.extend_from_slice(&keccak256(TRANSFER_FUNDS_SIGNATURE)[..4]);
    data.extend_from_slice(&[0u8; 12]);
    data.extend_from_slice(recipient.as_slice());
    data.extend_from_slice(&amount.to_be_bytes::<32>());
    Bytes::from(data)
}

pub struct Eip1193ContractConnector<T> {
    transport: Arc<T>,
    receipt_poll_interval: Duration,
}

impl<T: Eip1193Transport> Eip1193ContractConnector<T> {
    pub fn new(transport: Arc<T>, receipt_poll_interval: Duration) -> Self {
        Self {
            transport,
            receipt_poll_interval,
        }
    }
}

impl<T: Eip1193Transport> ContractConnector for Eip1193ContractConnector<T> {
    fn connect(&self, address: Address, signer: Arc<dyn WalletSigner>) -> Arc<dyn VaultContract> {
        Arc::new(VaultContractClient {
            address,
            signer,
            transport: Arc::clone(&self.transport),
            receipt_poll_interval: self.receipt_poll_interval,
        })
    }
}

/// Vault contract bound to one signer.
pub struct VaultContractClient<T> {
    address: Address,
    signer: Arc<dyn WalletSigner>,
    transport: Arc<T>,
    receipt_poll_interval: Duration,
}

#[async_trait]
impl<T: Eip1193Transport> VaultContract for VaultContractClient<T> {
    fn address(&self) -> Address {
        self.address
    }

    async fn transfer_funds(
        &self,
        recipient: Address,
        amount: U256,
        value: U256,
    ) -> Result<Box<dyn PendingTransaction>, ProviderError> {
        let tx = TransactionRequest {
            from: self.signer.address(),
            to: self.address,
            value,
            data: transfer_funds_calldata(recipient, amount),
        };
        let hash = self.signer.send_transaction(tx).await?;
        info!(tx_hash = %hash, contract = %self.address, "contract: transferFunds submitted");
        Ok(Box::new(ReceiptPoller {
            hash,
            transport: Arc::clone(&self.transport),
            interval: self.receipt_poll_interval,
        }))
    }
}

struct ReceiptPoller<T> {
    hash: B256,
    transport: Arc<T>,
    interval: Duration,
}

#[async_trait]
impl<T: Eip1193Transport> PendingTransaction for ReceiptPoller<T> {
    fn hash(&self) -> B256 {
        self.hash
    }

    async fn wait(&self) -> Result<TransactionReceipt, ProviderError> {
        loop {
            let receipt: Option<TransactionReceipt> = request_as(
                self.transport.as_ref(),
                "eth_getTransactionReceipt",
                json!([self.hash]),
            )
            .await?;
            match receipt {
                Some(receipt) if receipt.succeeded() => return Ok(receipt),
                Some(_) => {
                    return Err(ProviderError::new(
                        ProviderErrorKind::Rpc,
                        format!("transaction {} reverted", self.hash),
                    ))
                }
                None => {
                    debug!(tx_hash = %self.hash, "contract: receipt not available yet");
                    tokio::time::sleep(self.interval).await;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/contract_tests.rs"]
mod tests;
