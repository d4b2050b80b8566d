//! Wallet seam: the signing identity lives outside this client.
//!
//! The workflow only ever asks the wallet for an account and for message
//! signatures; transaction signing happens on the wallet side of the
//! `eth_sendTransaction` boundary.

use async_trait::async_trait;
use serde_json::json;

use veilforum_core::types::Address;

use crate::error::WalletError;
use crate::rpc::{RpcClient, RpcError};

/// EIP-1193 user-rejection code.
const USER_REJECTED_CODE: i64 = 4001;

/// An external signing identity.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user for an active account. Interactive; the user may
    /// reject, which is a terminal failure for the current attempt.
    async fn request_account(&self) -> Result<Address, WalletError>;

    /// Sign an arbitrary message with the given account (`personal_sign`).
    async fn sign_message(&self, address: Address, message: &str) -> Result<String, WalletError>;
}

/// Wallet provider over an account-holding RPC endpoint.
pub struct RpcWallet {
    rpc: RpcClient,
}

impl RpcWallet {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    fn map_rejection(error: RpcError) -> WalletError {
        match error {
            RpcError::Node { code, .. } if code == USER_REJECTED_CODE => WalletError::Rejected,
            other => WalletError::Rpc(other),
        }
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn request_account(&self) -> Result<Address, WalletError> {
        let accounts = self
            .rpc
            .call("eth_requestAccounts", json!([]))
            .await
            .map_err(Self::map_rejection)?;
        let first = accounts
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_str())
            .ok_or(WalletError::NoAccount)?;
        Address::from_hex(first).map_err(|e| WalletError::Provider(e.to_string()))
    }

    async fn sign_message(&self, address: Address, message: &str) -> Result<String, WalletError> {
        let signature = self
            .rpc
            .call(
                "personal_sign",
                json!([
                    format!("0x{}", hex::encode(message.as_bytes())),
                    address.to_string()
                ]),
            )
            .await
            .map_err(Self::map_rejection)?;
        signature
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::Provider(format!("bad signature response: {signature}")))
    }
}
