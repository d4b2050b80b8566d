//! Proof types and strict payload decoding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilforum_chain::abi::{self, AbiError, PROOF_WORDS};
use veilforum_core::types::Uint256;

/// Proof handling error types.
#[derive(Debug, Error)]
pub enum ProofError {
    /// The opaque payload did not decode into eight words. Local failure;
    /// no network call has been made when this is raised.
    #[error("Proof payload undecodable: {0}")]
    Undecodable(#[from] AbiError),

    #[error("Malformed proof field {field}: {value}")]
    MalformedField { field: &'static str, value: String },
}

/// Verification strength the widget is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationLevel {
    /// Device-bound credential
    Device,
    /// Biometric orb credential
    Orb,
}

impl std::str::FromStr for VerificationLevel {
    type Err = ProofError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "device" => Ok(VerificationLevel::Device),
            "orb" => Ok(VerificationLevel::Orb),
            other => Err(ProofError::MalformedField {
                field: "verification_level",
                value: other.to_string(),
            }),
        }
    }
}

/// Widget configuration. The app and action identifiers must match what
/// the contract was deployed with; `identifier_hash` gives the local side
/// of that comparison.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub app_id: String,
    pub action: String,
    pub verification_level: VerificationLevel,
}

/// The eight proof words the contract call takes.
pub type DecodedProof = [Uint256; PROOF_WORDS];

/// A personhood proof as delivered by the identity widget.
///
/// Consumed by exactly one publish attempt: the nullifier hash ties the
/// proof to at most one successful on-chain submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityProof {
    pub merkle_root: Uint256,
    pub nullifier_hash: Uint256,
    /// Opaque ABI-encoded `uint256[8]`, hex.
    pub proof: String,
}

impl IdentityProof {
    /// Parse the widget's raw success payload (`merkle_root`,
    /// `nullifier_hash`, `proof` as hex strings).
    pub fn from_widget_fields(
        merkle_root: &str,
        nullifier_hash: &str,
        proof: &str,
    ) -> Result<Self, ProofError> {
        let merkle_root =
            Uint256::from_hex(merkle_root).map_err(|_| ProofError::MalformedField {
                field: "merkle_root",
                value: merkle_root.to_string(),
            })?;
        let nullifier_hash =
            Uint256::from_hex(nullifier_hash).map_err(|_| ProofError::MalformedField {
                field: "nullifier_hash",
                value: nullifier_hash.to_string(),
            })?;
        Ok(IdentityProof {
            merkle_root,
            nullifier_hash,
            proof: proof.to_string(),
        })
    }

    /// Decode the opaque payload into the contract's fixed array. Strict:
    /// wrong length or malformed hex fails here, before any network call.
    pub fn decode(&self) -> Result<DecodedProof, ProofError> {
        Ok(abi::decode_proof_payload(&self.proof)?)
    }
}

/// Hash an identifier string the way the contract diagnostic expects
/// (Keccak-256 of the UTF-8 bytes, read as a 256-bit word).
pub fn identifier_hash(identifier: &str) -> Uint256 {
    Uint256(abi::keccak256(identifier.as_bytes()))
}
