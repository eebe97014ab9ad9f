use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ChainId;

/// EIP-1193 / JSON-RPC error codes, decoded once at the provider boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    UserRejected,
    Unauthorized,
    UnsupportedMethod,
    Disconnected,
    ChainDisconnected,
    UnrecognizedChain,
    Transport,
    Rpc,
}

impl ProviderErrorKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            4001 => Self::UserRejected,
            4100 => Self::Unauthorized,
            4200 | -32601 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            4902 => Self::UnrecognizedChain,
            _ => Self::Rpc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind:?}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
        }
    }

    pub fn from_code(code: i64, message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::from_code(code),
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Transport, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.kind == ProviderErrorKind::UserRejected
    }

    pub fn is_unrecognized_chain(&self) -> bool {
        self.kind == ProviderErrorKind::UnrecognizedChain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("current network is {current}, but {requested} was selected")]
pub struct NetworkMismatchError {
    pub current: ChainId,
    pub requested: ChainId,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("no wallet provider is available")]
    WalletUnavailable,
    #[error("request rejected by user")]
    UserRejected,
    #[error("wallet returned no accounts")]
    AccountUnavailable,
    #[error("wallet provider error: {0}")]
    Provider(ProviderError),
    #[error("chain {0} is not supported")]
    UnsupportedChain(ChainId),
    #[error(transparent)]
    NetworkMismatch(#[from] NetworkMismatchError),
    #[error("transfers are disabled on chain {0}")]
    TransferDisabledOnChain(ChainId),
    #[error("no contract handle; connect a wallet first")]
    NoContractHandle,
    #[error("clipboard write failed: {0}")]
    ClipboardFailure(String),
}

impl From<ProviderError> for WalletError {
    fn from(value: ProviderError) -> Self {
        if value.is_user_rejection() {
            Self::UserRejected
        } else {
            Self::Provider(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_provider_codes() {
        assert_eq!(ProviderErrorKind::from_code(4001), ProviderErrorKind::UserRejected);
        assert_eq!(ProviderErrorKind::from_code(4902), ProviderErrorKind::UnrecognizedChain);
        assert_eq!(ProviderErrorKind::from_code(-32601), ProviderErrorKind::UnsupportedMethod);
        assert_eq!(ProviderErrorKind::from_code(-32000), ProviderErrorKind::Rpc);
    }

    #[test]
    fn user_rejection_maps_to_wallet_rejection() {
        let err: WalletError = ProviderError::from_code(4001, "User denied").into();
        assert_eq!(err, WalletError::UserRejected);

        let err: WalletError = ProviderError::from_code(-32603, "internal").into();
        assert!(matches!(err, WalletError::Provider(inner) if inner.code == Some(-32603)));
    }
}
