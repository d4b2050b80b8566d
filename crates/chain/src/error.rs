//! Error types for contract and wallet operations.

use thiserror::Error;

use crate::abi::AbiError;
use crate::rpc::RpcError;

/// Errors that can occur against the contract.
#[derive(Debug, Error)]
pub enum ChainError {
    /// Transport or node-side failure; node errors carry the revert text.
    #[error(transparent)]
    Rpc(#[from] RpcError),

    /// ABI encoding/decoding failure
    #[error(transparent)]
    Abi(#[from] AbiError),

    /// Transaction was mined but reverted (receipt status 0)
    #[error("Transaction reverted on-chain: {tx_hash}")]
    Reverted { tx_hash: String },

    /// Confirmation never arrived within the polling window
    #[error("Timed out waiting for confirmation of {tx_hash}")]
    ConfirmationTimeout { tx_hash: String },

    /// Response shape did not match the fixed ABI
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

/// Result type for contract operations.
pub type ChainResult<T> = Result<T, ChainError>;

/// Errors from the wallet seam.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user declined the connection or signature request
    #[error("Request rejected by the user")]
    Rejected,

    /// No account is exposed by the provider
    #[error("No account available from the wallet provider")]
    NoAccount,

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("Wallet provider error: {0}")]
    Provider(String),
}
