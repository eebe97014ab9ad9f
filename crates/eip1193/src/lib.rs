//! EIP-1193 provider plumbing: a request/notification transport, the wallet
//! capabilities built on top of it, and the vault contract client.

pub mod contract;
pub mod http;
pub mod transport;
pub mod wallet;

#[cfg(test)]
#[path = "tests/mock_node.rs"]
pub(crate) mod mock_node;

pub use contract::{transfer_funds_calldata, Eip1193ContractConnector, VaultContractClient};
pub use http::HttpTransport;
pub use transport::Eip1193Transport;
pub use wallet::{InjectedWallet, TransportSigner};
