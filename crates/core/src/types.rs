//! Shared wire-level types for the VeilForum client.
//!
//! Values that cross the contract boundary are 256-bit words; values stored
//! on the content network are addressed by opaque identifier strings. Both
//! are modeled here as newtypes so that every crate in the workspace agrees
//! on parsing, formatting, and serde representation.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{CoreError, CoreResult};

/// A 256-bit unsigned integer, stored big-endian.
///
/// Used for merkle roots, nullifier hashes, anonymous author ids, proof
/// words, and identifier hashes. Formats as minimal `0x`-prefixed hex;
/// parsing accepts any hex string up to 64 nibbles and left-pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Uint256(pub [u8; 32]);

impl Uint256 {
    pub const ZERO: Uint256 = Uint256([0u8; 32]);

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Uint256(bytes)
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.is_empty() || stripped.len() > 64 {
            return Err(CoreError::InvalidHex(s.to_string()));
        }
        // hex::decode requires an even nibble count
        let padded = if stripped.len() % 2 == 1 {
            format!("0{stripped}")
        } else {
            stripped.to_string()
        };
        let decoded =
            hex::decode(&padded).map_err(|_| CoreError::InvalidHex(s.to_string()))?;
        let mut bytes = [0u8; 32];
        bytes[32 - decoded.len()..].copy_from_slice(&decoded);
        Ok(Uint256(bytes))
    }

    /// The big-endian 32-byte representation (one ABI word).
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Lossy narrowing to u64; the high 24 bytes must be zero.
    pub fn as_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(low))
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for Uint256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let full = hex::encode(self.0);
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            write!(f, "0x0")
        } else {
            write!(f, "0x{trimmed}")
        }
    }
}

impl Serialize for Uint256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Uint256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Uint256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 20-byte account address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Parse a `0x`-prefixed 40-nibble address. Strict: no padding.
    pub fn from_hex(s: &str) -> CoreResult<Self> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        if stripped.len() != 40 {
            return Err(CoreError::InvalidHex(s.to_string()));
        }
        let decoded =
            hex::decode(stripped).map_err(|_| CoreError::InvalidHex(s.to_string()))?;
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&decoded);
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a document on the content-addressed storage network.
///
/// Opaque to this client; the network derives it from the content bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentHash {
    fn from(s: &str) -> Self {
        ContentHash(s.to_string())
    }
}

/// A published post as recorded by the contract.
///
/// `id` is 1-based and assigned on-chain; `author_id` is the anonymous
/// identity the contract derives from the personhood proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub content_hash: ContentHash,
    pub author_id: Uint256,
}

/// The comparison clause of an access-control condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnValueTest {
    pub comparator: String,
    pub value: String,
}

/// One predicate evaluated by the threshold-decryption network to gate
/// symmetric-key release. Carried as structured pass-through; this client
/// never interprets it beyond construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessControlCondition {
    pub contract_address: String,
    pub standard_contract_type: String,
    pub chain: String,
    pub method: String,
    pub parameters: Vec<String>,
    pub return_value_test: ReturnValueTest,
}

impl AccessControlCondition {
    /// The predicate this deployment hardcodes: caller balance at least
    /// `min_balance_wei` on `chain`.
    pub fn balance_at_least(chain: &str, min_balance_wei: &str) -> Self {
        AccessControlCondition {
            contract_address: String::new(),
            standard_contract_type: String::new(),
            chain: chain.to_string(),
            method: "eth_getBalance".to_string(),
            parameters: vec![":userAddress".to_string(), "latest".to_string()],
            return_value_test: ReturnValueTest {
                comparator: ">=".to_string(),
                value: min_balance_wei.to_string(),
            },
        }
    }
}

/// The off-chain document a post's content hash points at.
///
/// Written once at publish time, never mutated. Field names match the
/// stored JSON documents, so renames here are wire-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostMetadata {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_image_hash: Option<ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_symmetric_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_control_conditions: Option<Vec<AccessControlCondition>>,
}

impl PostMetadata {
    /// Metadata for a text-only post.
    pub fn text_only(text: impl Into<String>) -> Self {
        PostMetadata {
            text: text.into(),
            encrypted_image_hash: None,
            encrypted_symmetric_key: None,
            access_control_conditions: None,
        }
    }
}
