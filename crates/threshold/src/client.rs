//! Key custody calls against the threshold-decryption network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use veilforum_core::config::ThresholdConfig;
use veilforum_core::types::AccessControlCondition;

use crate::cipher::SymmetricKey;

/// Threshold network error types.
#[derive(Debug, Error)]
pub enum ThresholdError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The network refused to release the key. Deliberately generic: the
    /// response must not reveal which condition clause failed.
    #[error("Access denied. You may not meet the access requirements.")]
    AccessDenied,

    #[error("Network rejected the request with status {0}")]
    Rejected(u16),

    #[error("Malformed network response: {0}")]
    MalformedResponse(String),

    #[error("Invalid key material returned: {0}")]
    InvalidKey(String),
}

/// Result type for threshold network operations.
pub type ThresholdResult<T> = Result<T, ThresholdError>;

/// Wallet-produced authentication signature, passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSig {
    pub sig: String,
    #[serde(rename = "derivedVia")]
    pub derived_via: String,
    #[serde(rename = "signedMessage")]
    pub signed_message: String,
    pub address: String,
}

/// Handle to the threshold-decryption network.
#[async_trait]
pub trait ThresholdClient: Send + Sync {
    /// Register a symmetric key under the given conditions; returns the
    /// encrypted key blob (hex) to store alongside the content.
    async fn save_encryption_key(
        &self,
        conditions: &[AccessControlCondition],
        key: &SymmetricKey,
        auth_sig: &AuthSig,
        chain: &str,
    ) -> ThresholdResult<String>;

    /// Recover a symmetric key, subject to condition evaluation against
    /// the caller identified by `auth_sig`.
    async fn get_encryption_key(
        &self,
        conditions: &[AccessControlCondition],
        encrypted_key: &str,
        chain: &str,
        auth_sig: &AuthSig,
    ) -> ThresholdResult<SymmetricKey>;
}

/// HTTP implementation bound to one named network.
pub struct HttpThresholdClient {
    http: reqwest::Client,
    config: ThresholdConfig,
}

impl HttpThresholdClient {
    pub fn new(config: ThresholdConfig) -> Self {
        info!(network = %config.network, "connecting threshold client");
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ThresholdClient for HttpThresholdClient {
    async fn save_encryption_key(
        &self,
        conditions: &[AccessControlCondition],
        key: &SymmetricKey,
        auth_sig: &AuthSig,
        chain: &str,
    ) -> ThresholdResult<String> {
        debug!(chain, network = %self.config.network, "saving encryption key");
        let response = self
            .http
            .post(self.endpoint("encryption/store"))
            .json(&json!({
                "network": self.config.network,
                "chain": chain,
                "accessControlConditions": conditions,
                "symmetricKey": hex::encode(key.as_bytes()),
                "authSig": auth_sig,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThresholdError::Rejected(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ThresholdError::MalformedResponse(e.to_string()))?;
        body.get("encryptedSymmetricKey")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                ThresholdError::MalformedResponse("missing encryptedSymmetricKey".to_string())
            })
    }

    async fn get_encryption_key(
        &self,
        conditions: &[AccessControlCondition],
        encrypted_key: &str,
        chain: &str,
        auth_sig: &AuthSig,
    ) -> ThresholdResult<SymmetricKey> {
        debug!(chain, network = %self.config.network, "requesting encryption key");
        let response = self
            .http
            .post(self.endpoint("encryption/retrieve"))
            .json(&json!({
                "network": self.config.network,
                "chain": chain,
                "accessControlConditions": conditions,
                "toDecrypt": encrypted_key,
                "authSig": auth_sig,
            }))
            .send()
            .await?;

        let status = response.status();
        // Both unsatisfied conditions and bad auth collapse into the same
        // generic denial.
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ThresholdError::AccessDenied);
        }
        if !status.is_success() {
            return Err(ThresholdError::Rejected(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ThresholdError::MalformedResponse(e.to_string()))?;
        let key_hex = body
            .get("symmetricKey")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ThresholdError::MalformedResponse("missing symmetricKey".to_string()))?;
        let bytes =
            hex::decode(key_hex).map_err(|e| ThresholdError::InvalidKey(e.to_string()))?;
        SymmetricKey::from_bytes(&bytes).map_err(|e| ThresholdError::InvalidKey(e.to_string()))
    }
}
