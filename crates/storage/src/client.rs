//! Upload and gateway fetch against the storage network.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use veilforum_core::config::StorageConfig;
use veilforum_core::types::ContentHash;

/// Storage client error types.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Gateway returned status {status} for {hash}")]
    Gateway { status: u16, hash: String },

    #[error("Upload rejected with status {status}: {body}")]
    UploadRejected { status: u16, body: String },

    /// Upload response did not contain a content identifier
    #[error("Malformed upload response: {0}")]
    MalformedResponse(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Handle to the content-addressed storage network.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload raw bytes; returns the content identifier.
    async fn upload_bytes(&self, name: &str, bytes: Vec<u8>) -> StorageResult<ContentHash>;

    /// Upload a text document; returns the content identifier.
    async fn upload_text(&self, name: &str, text: String) -> StorageResult<ContentHash>;

    /// Fetch content by identifier from the gateway.
    async fn fetch(&self, hash: &ContentHash) -> StorageResult<Vec<u8>>;
}

/// Shape of the upload endpoint's response. Validated immediately at the
/// boundary; nothing downstream sees the raw JSON.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    #[serde(rename = "Hash")]
    hash: String,
}

/// HTTP implementation over the network's add endpoint and public gateway.
pub struct HttpStorageClient {
    http: reqwest::Client,
    config: StorageConfig,
}

impl HttpStorageClient {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> StorageResult<ContentHash> {
        debug!(name, size = bytes.len(), "uploading to storage network");
        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .header("X-File-Name", name)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::UploadRejected {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::MalformedResponse(e.to_string()))?;
        info!(name, hash = %parsed.data.hash, "upload complete");
        Ok(ContentHash(parsed.data.hash))
    }
}

#[async_trait]
impl StorageClient for HttpStorageClient {
    async fn upload_bytes(&self, name: &str, bytes: Vec<u8>) -> StorageResult<ContentHash> {
        self.upload(name, bytes).await
    }

    async fn upload_text(&self, name: &str, text: String) -> StorageResult<ContentHash> {
        self.upload(name, text.into_bytes()).await
    }

    async fn fetch(&self, hash: &ContentHash) -> StorageResult<Vec<u8>> {
        let url = format!(
            "{}/ipfs/{}",
            self.config.gateway_url.trim_end_matches('/'),
            hash
        );
        debug!(%url, "fetching from gateway");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Gateway {
                status: status.as_u16(),
                hash: hash.to_string(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}
