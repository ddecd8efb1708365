//! Domain primitives: TimeSecs, Address, DebtId, TxHash.

use alloy_primitives::{hex, U256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;
use thiserror::Error;

/// Time in seconds since Unix epoch, as stored by the ledger contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSecs(pub i64);

impl TimeSecs {
    pub fn new(secs: i64) -> Self {
        TimeSecs(secs)
    }

    pub fn now() -> Self {
        TimeSecs(chrono::Utc::now().timestamp())
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }

    pub fn saturating_add(&self, secs: i64) -> Self {
        TimeSecs(self.0.saturating_add(secs))
    }

    pub fn saturating_sub(&self, other: TimeSecs) -> i64 {
        self.0.saturating_sub(other.0)
    }
}

/// Ledger-assigned debt identifier (a `uint256` on chain).
///
/// Serialized as a decimal string so ids past 2^53 survive JSON clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DebtId(pub U256);

impl DebtId {
    pub fn new(id: u64) -> Self {
        DebtId(U256::from(id))
    }

    pub fn from_uint(id: U256) -> Self {
        DebtId(id)
    }

    pub fn as_uint(&self) -> U256 {
        self.0
    }
}

impl std::fmt::Display for DebtId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid debt id: {0}")]
pub struct DebtIdParseError(pub String);

impl FromStr for DebtId {
    type Err = DebtIdParseError;

    /// Decimal digits only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DebtIdParseError(s.to_string()));
        }
        U256::from_str_radix(digits, 10)
            .map(DebtId)
            .map_err(|_| DebtIdParseError(s.to_string()))
    }
}

impl Serialize for DebtId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DebtId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid address: {0}")]
pub struct AddressParseError(pub String);

/// EVM account address.
///
/// Equality is on the 20 bytes, so checksum casing never matters. Displays
/// as lowercase `0x` hex.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub alloy_primitives::Address);

impl Address {
    /// Validate `0x` + 40 hex digits, in any case.
    pub fn parse(input: &str) -> Result<Self, AddressParseError> {
        let trimmed = input.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .filter(|h| h.len() == 40)
            .ok_or_else(|| AddressParseError(input.to_string()))?;
        alloy_primitives::Address::from_str(hex_part)
            .map(Address)
            .map_err(|_| AddressParseError(input.to_string()))
    }

    pub fn zero() -> Self {
        Address(alloy_primitives::Address::ZERO)
    }

    pub fn inner(&self) -> alloy_primitives::Address {
        self.0
    }
}

impl From<alloy_primitives::Address> for Address {
    fn from(addr: alloy_primitives::Address) -> Self {
        Address(addr)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode_prefixed(self.0.as_slice()))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Address::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Transaction hash returned by a confirmed write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: String) -> Self {
        TxHash(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
