//! Core types used throughout the system
//!
//! Fundamental identifiers and amount types shared by the allocator,
//! the queue builder and the payout coordinator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Amount in minor units (the smallest indivisible unit of the asset).
///
/// # Constraints:
/// - **Integer only**: allocation math never touches floating point
/// - **Wide**: `u128` covers 18-decimal assets without overflow headroom games
pub type AmountMinor = u128;

/// Number of hex digits in a canonical address body (20 bytes).
const ADDRESS_HEX_LEN: usize = 40;

/// Error returned when an address string fails validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid address: {0:?}")]
pub struct AddressError(pub String);

/// A recipient address: `0x` followed by 40 hex digits.
///
/// Parsing canonicalizes the hex body to lowercase so that equality and
/// duplicate detection are case-insensitive. The wire form is the plain
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Full canonical form, `0x`-prefixed lowercase hex.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated display form for notifications and logs: `0x1234...abcd`.
    pub fn short(&self) -> String {
        format!("{}...{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AddressError(s.to_string()))?;

        if body.len() != ADDRESS_HEX_LEN || !body.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AddressError(s.to_string()));
        }

        Ok(Address(format!("0x{}", body.to_ascii_lowercase())))
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

/// Batch run identifier - ULID-based unique identifier
///
/// Using ULID provides:
/// - Monotonic, sortable IDs
/// - No coordination needed
/// - 128-bit with good entropy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(ulid::Ulid);

impl BatchId {
    /// Generate a new unique BatchId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BatchId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for BatchId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
