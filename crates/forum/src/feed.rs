//! The post feed: ordering, de-duplication, lazy metadata, gated decrypt.
//!
//! Posts arrive from two independent paths -- the initial contract walk
//! and the live event subscription -- which may deliver the same id. The
//! feed is the single point that reconciles them: strictly descending id
//! order, and an id already present is ignored.

use thiserror::Error;
use tracing::{debug, info};

use veilforum_chain::contract::ForumContract;
use veilforum_chain::error::ChainResult;
use veilforum_chain::wallet::WalletProvider;
use veilforum_core::types::{Address, Post, PostMetadata};
use veilforum_storage::client::StorageClient;
use veilforum_threshold::cipher::decrypt_bytes;
use veilforum_threshold::client::{AuthSig, ThresholdClient};

/// Feed rendering error types.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Failed to fetch post metadata: {0}")]
    MetadataFetch(#[from] veilforum_storage::client::StorageError),

    #[error("Post metadata is not valid JSON: {0}")]
    MetadataParse(#[from] serde_json::Error),

    /// The post has no encrypted attachment to decrypt
    #[error("This post has no encrypted attachment.")]
    NoEncryptedImage,

    /// Deliberately generic: covers unsatisfied conditions and
    /// authentication failures alike, without naming the failing clause.
    #[error("Access denied. You may not meet the access requirements.")]
    AccessDenied,
}

/// In-memory feed, ordered by strictly descending post id.
#[derive(Debug, Default)]
pub struct Feed {
    posts: Vec<Post>,
}

impl Feed {
    pub fn new() -> Self {
        Feed::default()
    }

    /// Populate from the contract: walk ids from `postCount` down to 1,
    /// one fetch per post.
    pub async fn load_initial(contract: &dyn ForumContract) -> ChainResult<Self> {
        let count = contract.post_count().await?;
        info!(count, "loading feed");
        let mut feed = Feed::new();
        for id in (1..=count).rev() {
            let post = contract.post(id).await?;
            feed.insert(post);
        }
        Ok(feed)
    }

    /// Insert a post at its position. Returns false (and changes nothing)
    /// if the id is already present.
    pub fn insert(&mut self, post: Post) -> bool {
        match self.posts.binary_search_by(|p| post.id.cmp(&p.id)) {
            Ok(_) => {
                debug!(id = post.id, "duplicate post delivery ignored");
                false
            }
            Err(position) => {
                self.posts.insert(position, post);
                true
            }
        }
    }

    /// Apply a live `PostPublished` event. Same de-duplication rule as
    /// `insert`; the event stream is the source of truth for feed updates.
    pub fn apply_event(&mut self, post: Post) -> bool {
        self.insert(post)
    }

    /// Posts in render order (newest first).
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

/// Fetches metadata and performs the user-initiated decrypt action.
pub struct FeedRenderer<'a> {
    storage: &'a dyn StorageClient,
    threshold: &'a dyn ThresholdClient,
    wallet: &'a dyn WalletProvider,
    chain: String,
}

impl<'a> FeedRenderer<'a> {
    pub fn new(
        storage: &'a dyn StorageClient,
        threshold: &'a dyn ThresholdClient,
        wallet: &'a dyn WalletProvider,
        chain: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            threshold,
            wallet,
            chain: chain.into(),
        }
    }

    /// Fetch one post's metadata document. Lazy and independent per post;
    /// no batching.
    pub async fn metadata(&self, post: &Post) -> Result<PostMetadata, FeedError> {
        let bytes = self.storage.fetch(&post.content_hash).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Decrypt a post's attached image, gated by the same access-control
    /// conditions recorded at encryption time. Any denial -- unsatisfied
    /// predicate or failed authentication -- surfaces as the one generic
    /// `AccessDenied`.
    pub async fn decrypt_image(&self, metadata: &PostMetadata) -> Result<Vec<u8>, FeedError> {
        let image_hash = metadata
            .encrypted_image_hash
            .as_ref()
            .ok_or(FeedError::NoEncryptedImage)?;
        let encrypted_key = metadata
            .encrypted_symmetric_key
            .as_ref()
            .ok_or(FeedError::NoEncryptedImage)?;
        let conditions = metadata
            .access_control_conditions
            .as_ref()
            .ok_or(FeedError::NoEncryptedImage)?;

        let auth_sig = self
            .fresh_auth_sig()
            .await
            .map_err(|_| FeedError::AccessDenied)?;
        let key = self
            .threshold
            .get_encryption_key(conditions, encrypted_key, &self.chain, &auth_sig)
            .await
            .map_err(|_| FeedError::AccessDenied)?;

        let ciphertext = self.storage.fetch(image_hash).await?;
        decrypt_bytes(&key, &ciphertext).map_err(|_| FeedError::AccessDenied)
    }

    async fn fresh_auth_sig(
        &self,
    ) -> Result<AuthSig, veilforum_chain::error::WalletError> {
        let address: Address = self.wallet.request_account().await?;
        let message = format!("VeilForum: authorize key custody for {address}");
        let sig = self.wallet.sign_message(address, &message).await?;
        Ok(AuthSig {
            sig,
            derived_via: "web3.eth.personal.sign".to_string(),
            signed_message: message,
            address: address.to_string(),
        })
    }
}
