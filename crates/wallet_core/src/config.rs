use std::{fs, io, path::Path, str::FromStr, time::Duration};

use alloy_primitives::Address;
use serde::Deserialize;
use shared::{
    chains::{ChainInfo, ChainRegistry, SEPOLIA},
    domain::{parse_address, ChainId, DEFAULT_CHAIN},
};
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "vault.toml";

const DEFAULT_CONTRACT_ADDRESS: Address = Address::new([
    0x91, 0xf1, 0xd8, 0x11, 0x1b, 0x87, 0xa7, 0x97, 0x4a, 0x85, 0x0c, 0xff, 0x9d, 0xfc, 0x46, 0xad,
    0x7f, 0x3b, 0xe7, 0x6c,
]);

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file '{path}': {source}")]
    Read { path: String, source: io::Error },
    #[error("malformed settings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct WalletSettings {
    pub contract_address: Address,
    pub default_chain: ChainId,
    pub transfer_disabled_chain: ChainId,
    pub rpc_url: String,
    /// RPC endpoint offered when adding a chain the registry does not know.
    pub fallback_rpc_url: Option<String>,
    pub receipt_poll_interval: Duration,
    pub chain_poll_interval: Duration,
    pub extra_chains: Vec<ChainInfo>,
}

impl Default for WalletSettings {
    fn default() -> Self {
        Self {
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            default_chain: DEFAULT_CHAIN,
            transfer_disabled_chain: SEPOLIA,
            rpc_url: "http://127.0.0.1:8545".into(),
            fallback_rpc_url: None,
            receipt_poll_interval: Duration::from_secs(1),
            chain_poll_interval: Duration::from_secs(4),
            extra_chains: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    contract_address: Option<String>,
    default_chain: Option<String>,
    transfer_disabled_chain: Option<String>,
    rpc_url: Option<String>,
    fallback_rpc_url: Option<String>,
    receipt_poll_interval_ms: Option<u64>,
    chain_poll_interval_ms: Option<u64>,
    #[serde(default)]
    chains: Vec<ChainInfo>,
}

impl WalletSettings {
    pub fn registry(&self) -> ChainRegistry {
        let mut registry = ChainRegistry::with_builtin_chains();
        for info in &self.extra_chains {
            registry.insert(info.clone());
        }
        registry
    }

    pub fn apply_toml(&mut self, raw: &str) -> Result<(), SettingsError> {
        let file: SettingsFile = toml::from_str(raw)?;
        if let Some(v) = file.contract_address {
            self.contract_address = parse_setting("contract_address", &v, parse_address)?;
        }
        if let Some(v) = file.default_chain {
            self.default_chain = parse_setting("default_chain", &v, ChainId::from_str)?;
        }
        if let Some(v) = file.transfer_disabled_chain {
            self.transfer_disabled_chain =
                parse_setting("transfer_disabled_chain", &v, ChainId::from_str)?;
        }
        if let Some(v) = file.rpc_url {
            self.rpc_url = v;
        }
        if let Some(v) = file.fallback_rpc_url {
            self.fallback_rpc_url = Some(v);
        }
        if let Some(v) = file.receipt_poll_interval_ms {
            self.receipt_poll_interval = poll_interval("receipt_poll_interval_ms", v)?;
        }
        if let Some(v) = file.chain_poll_interval_ms {
            self.chain_poll_interval = poll_interval("chain_poll_interval_ms", v)?;
        }
        self.extra_chains.extend(file.chains);
        Ok(())
    }

    /// Applies `APP__*` overrides; `lookup` is `std::env::var` outside tests.
    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        if let Some(v) = lookup("APP__CONTRACT_ADDRESS") {
            self.contract_address = parse_setting("APP__CONTRACT_ADDRESS", &v, parse_address)?;
        }
        if let Some(v) = lookup("APP__DEFAULT_CHAIN") {
            self.default_chain = parse_setting("APP__DEFAULT_CHAIN", &v, ChainId::from_str)?;
        }
        if let Some(v) = lookup("APP__TRANSFER_DISABLED_CHAIN") {
            self.transfer_disabled_chain =
                parse_setting("APP__TRANSFER_DISABLED_CHAIN", &v, ChainId::from_str)?;
        }
        if let Some(v) = lookup("APP__RPC_URL") {
            self.rpc_url = v;
        }
        if let Some(v) = lookup("APP__FALLBACK_RPC_URL") {
            self.fallback_rpc_url = Some(v);
        }
        if let Some(v) = lookup("APP__RECEIPT_POLL_INTERVAL_MS") {
            let millis = parse_setting("APP__RECEIPT_POLL_INTERVAL_MS", &v, u64::from_str)?;
            self.receipt_poll_interval = poll_interval("APP__RECEIPT_POLL_INTERVAL_MS", millis)?;
        }
        if let Some(v) = lookup("APP__CHAIN_POLL_INTERVAL_MS") {
            let millis = parse_setting("APP__CHAIN_POLL_INTERVAL_MS", &v, u64::from_str)?;
            self.chain_poll_interval = poll_interval("APP__CHAIN_POLL_INTERVAL_MS", millis)?;
        }
        Ok(())
    }
}

fn parse_setting<T, E>(
    key: &'static str,
    value: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T, SettingsError> {
    parse(value.trim()).map_err(|_| SettingsError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Poll intervals must be non-zero.
fn poll_interval(key: &'static str, millis: u64) -> Result<Duration, SettingsError> {
    if millis == 0 {
        return Err(SettingsError::InvalidValue {
            key,
            value: millis.to_string(),
        });
    }
    Ok(Duration::from_millis(millis))
}

/// Defaults, then the settings file if present, then the environment.
pub fn load_settings(path: Option<&Path>) -> Result<WalletSettings, SettingsError> {
    let mut settings = WalletSettings::default();
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));

    match fs::read_to_string(path) {
        Ok(raw) => settings.apply_toml(&raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
