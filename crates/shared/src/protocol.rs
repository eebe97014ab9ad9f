use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    chains::{ChainInfo, NativeCurrency},
    domain::ChainId,
    error::ProviderError,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            method: method.into(),
            params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<JsonRpcErrorObject> for ProviderError {
    fn from(value: JsonRpcErrorObject) -> Self {
        ProviderError::from_code(value.code, value.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<JsonRpcErrorObject>,
}

impl JsonRpcResponse {
    pub fn into_result(self) -> Result<Value, ProviderError> {
        match (self.error, self.result) {
            (Some(error), _) => Err(error.into()),
            (None, Some(result)) => Ok(result),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// `wallet_switchEthereumChain` parameter object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchChainParams {
    pub chain_id: String,
}

impl SwitchChainParams {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id: chain_id.to_hex(),
        }
    }
}

/// `wallet_addEthereumChain` parameter object (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

impl AddChainParams {
    pub fn custom(chain_id: ChainId, rpc_url: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.to_hex(),
            chain_name: "Custom Network".into(),
            rpc_urls: vec![rpc_url.into()],
            native_currency: None,
            block_explorer_urls: Vec::new(),
        }
    }
}

impl From<&ChainInfo> for AddChainParams {
    fn from(info: &ChainInfo) -> Self {
        Self {
            chain_id: info.chain_id.to_hex(),
            chain_name: info.name.clone(),
            rpc_urls: info.rpc_urls.clone(),
            native_currency: Some(info.native_currency.clone()),
            block_explorer_urls: info.block_explorer_urls.clone(),
        }
    }
}

/// `eth_sendTransaction` call object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    /// Pre-Byzantium receipts carry no status and count as success.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| status == U64::from(1u8))
    }
}
