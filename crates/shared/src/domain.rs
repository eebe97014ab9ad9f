use std::{fmt, str::FromStr};

use alloy_primitives::{
    utils::{format_ether, parse_ether},
    Address, U256,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chain selected before any wallet connection reports the real one.
pub const DEFAULT_CHAIN: ChainId = ChainId(1);

/// Wei per displayed balance step (four decimal places of ether).
const DISPLAY_STEP_WEI: u64 = 100_000_000_000_000;

/// Numeric chain identifier. Always compared by value; the canonical text form
/// is decimal, wallets report and accept `0x`-prefixed hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainIdParseError {
    #[error("chain id must not be empty")]
    Empty,
    #[error("invalid chain id '{0}'")]
    Invalid(String),
}

impl ChainId {
    pub fn from_hex(raw: &str) -> Result<Self, ChainIdParseError> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        if digits.is_empty() {
            return Err(ChainIdParseError::Empty);
        }
        u64::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ChainIdParseError::Invalid(raw.to_string()))
    }

    pub fn to_hex(self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl FromStr for ChainId {
    type Err = ChainIdParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ChainIdParseError::Empty);
        }
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            return Self::from_hex(trimmed);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ChainIdParseError::Invalid(raw.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for ChainId {
    fn default() -> Self {
        DEFAULT_CHAIN
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountParseError {
    #[error("amount must not be empty")]
    Empty,
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("invalid amount '{0}'")]
    Invalid(String),
}

/// Native-currency amount held as exact wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct EthAmount {
    wei: U256,
}

impl EthAmount {
    pub const ZERO: Self = Self { wei: U256::ZERO };

    pub fn from_wei(wei: U256) -> Self {
        Self { wei }
    }

    /// Parses a decimal ether string (`"0.5"`, `"12"`). Rejects signs,
    /// exponents and more than 18 fractional digits.
    pub fn parse_ether(raw: &str) -> Result<Self, AmountParseError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AmountParseError::Empty);
        }
        let mut dots = 0;
        for ch in trimmed.chars() {
            match ch {
                '0'..='9' => {}
                '.' => dots += 1,
                _ => return Err(AmountParseError::Invalid(raw.to_string())),
            }
        }
        if dots > 1 || trimmed == "." {
            return Err(AmountParseError::Invalid(raw.to_string()));
        }
        let wei =
            parse_ether(trimmed).map_err(|_| AmountParseError::Invalid(raw.to_string()))?;
        Ok(Self { wei })
    }

    /// Same as [`EthAmount::parse_ether`] but also rejects zero.
    pub fn parse_positive(raw: &str) -> Result<Self, AmountParseError> {
        let amount = Self::parse_ether(raw)?;
        if amount.is_zero() {
            return Err(AmountParseError::NotPositive);
        }
        Ok(amount)
    }

    pub fn wei(&self) -> U256 {
        self.wei
    }

    pub fn is_zero(&self) -> bool {
        self.wei.is_zero()
    }

    /// Balance display form: ether rounded half-up to four decimals.
    pub fn to_display_4dp(&self) -> String {
        let step = U256::from(DISPLAY_STEP_WEI);
        let rounded = self.wei.saturating_add(step / U256::from(2u8)) / step;
        let whole = rounded / U256::from(10_000u64);
        let frac = (rounded % U256::from(10_000u64)).to::<u64>();
        format!("{whole}.{frac:04}")
    }
}

impl fmt::Display for EthAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = format_ether(self.wei);
        let trimmed = if full.contains('.') {
            full.trim_end_matches('0').trim_end_matches('.')
        } else {
            full.as_str()
        };
        f.write_str(trimmed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    #[error("address must start with 0x")]
    MissingPrefix,
    #[error("address must be 40 hex characters, got {0}")]
    Length(usize),
    #[error("address contains non-hex characters")]
    NonHex,
    #[error("address checksum mismatch")]
    Checksum,
}

/// Syntactic address check: `0x` + 40 hex digits. Mixed-case input must carry
/// a valid EIP-55 checksum; all-lower or all-upper input is accepted as is.
pub fn parse_address(raw: &str) -> Result<Address, AddressParseError> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .ok_or(AddressParseError::MissingPrefix)?;
    if digits.len() != 40 {
        return Err(AddressParseError::Length(digits.len()));
    }
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(AddressParseError::NonHex);
    }
    let has_lower = digits.chars().any(|ch| ch.is_ascii_lowercase());
    let has_upper = digits.chars().any(|ch| ch.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(trimmed, None).map_err(|_| AddressParseError::Checksum);
    }
    Address::from_str(trimmed).map_err(|_| AddressParseError::NonHex)
}
