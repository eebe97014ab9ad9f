use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::ChainId;

/// Sepolia; the vault does not accept transfers there.
pub const SEPOLIA: ChainId = ChainId(11_155_111);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    pub fn ether() -> Self {
        Self {
            name: "Ether".into(),
            symbol: "ETH".into(),
            decimals: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainInfo {
    pub chain_id: ChainId,
    pub name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
    #[serde(default)]
    pub testnet: bool,
}

impl ChainInfo {
    fn builtin(
        chain_id: u64,
        name: &str,
        currency: NativeCurrency,
        rpc: &str,
        explorer: &str,
        testnet: bool,
    ) -> Self {
        Self {
            chain_id: ChainId(chain_id),
            name: name.into(),
            native_currency: currency,
            rpc_urls: vec![rpc.into()],
            block_explorer_urls: vec![explorer.into()],
            testnet,
        }
    }
}

/// Known networks keyed by chain id. Lookups never hit the wallet.
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    chains: BTreeMap<ChainId, ChainInfo>,
}

impl ChainRegistry {
    pub fn empty() -> Self {
        Self {
            chains: BTreeMap::new(),
        }
    }

    pub fn with_builtin_chains() -> Self {
        let mut registry = Self::empty();
        for info in [
            ChainInfo::builtin(
                1,
                "Ethereum Mainnet",
                NativeCurrency::ether(),
                "https://cloudflare-eth.com",
                "https://etherscan.io",
                false,
            ),
            ChainInfo::builtin(
                SEPOLIA.0,
                "Sepolia",
                NativeCurrency {
                    name: "Sepolia Ether".into(),
                    symbol: "SEP".into(),
                    decimals: 18,
                },
                "https://rpc.sepolia.org",
                "https://sepolia.etherscan.io",
                true,
            ),
            ChainInfo::builtin(
                10,
                "OP Mainnet",
                NativeCurrency::ether(),
                "https://mainnet.optimism.io",
                "https://optimistic.etherscan.io",
                false,
            ),
            ChainInfo::builtin(
                56,
                "BNB Smart Chain",
                NativeCurrency {
                    name: "BNB".into(),
                    symbol: "BNB".into(),
                    decimals: 18,
                },
                "https://bsc-dataseed.binance.org",
                "https://bscscan.com",
                false,
            ),
            ChainInfo::builtin(
                137,
                "Polygon",
                NativeCurrency {
                    name: "POL".into(),
                    symbol: "POL".into(),
                    decimals: 18,
                },
                "https://polygon-rpc.com",
                "https://polygonscan.com",
                false,
            ),
            ChainInfo::builtin(
                8453,
                "Base",
                NativeCurrency::ether(),
                "https://mainnet.base.org",
                "https://basescan.org",
                false,
            ),
            ChainInfo::builtin(
                42161,
                "Arbitrum One",
                NativeCurrency::ether(),
                "https://arb1.arbitrum.io/rpc",
                "https://arbiscan.io",
                false,
            ),
        ] {
            registry.insert(info);
        }
        registry
    }

    /// Adds or replaces an entry.
    pub fn insert(&mut self, info: ChainInfo) {
        self.chains.insert(info.chain_id, info);
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&ChainInfo> {
        self.chains.get(&chain_id)
    }

    pub fn contains(&self, chain_id: ChainId) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn display_name(&self, chain_id: ChainId) -> String {
        self.get(chain_id)
            .map(|info| info.name.clone())
            .unwrap_or_else(|| format!("chain {chain_id}"))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainInfo> {
        self.chains.values()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::with_builtin_chains()
    }
}
