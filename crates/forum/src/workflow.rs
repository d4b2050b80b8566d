//! The publish workflow.
//!
//! One publish attempt is a strictly sequential pass through nine steps;
//! every step either succeeds with a payload for the next step or fails
//! terminally for the attempt. There is no retry and no rollback: an
//! orphaned ciphertext or metadata document may remain on the storage
//! network after a late failure (known gap), and a consumed proof cannot
//! be reused, so a new attempt starts from a fresh verification.

use thiserror::Error;
use tracing::{info, warn};

use veilforum_chain::contract::{ForumContract, PublishArgs};
use veilforum_chain::error::{ChainError, WalletError};
use veilforum_chain::rpc::RpcError;
use veilforum_chain::wallet::WalletProvider;
use veilforum_core::types::{AccessControlCondition, ContentHash, PostMetadata};
use veilforum_identity::proof::{IdentityProof, ProofError};
use veilforum_storage::client::{StorageClient, StorageError};
use veilforum_threshold::cipher::{encrypt_bytes, SymmetricKey};
use veilforum_threshold::client::{AuthSig, ThresholdClient};

use crate::draft::PostDraft;

/// Classified reason for a contract-level rejection, from either the
/// simulation dry run or the submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    /// The nullifier backing this proof already backed a publish
    NullifierAlreadyUsed,
    /// The contract's proof verification failed
    InvalidProof,
    /// The user declined to sign the transaction
    UserRejected,
    /// Account cannot cover gas
    InsufficientFunds,
    /// Anything the matcher does not recognize
    Unknown(String),
}

impl RevertReason {
    /// Classify a contract failure by its reason text. The matcher keys on
    /// the contract's custom error names and the common provider phrases.
    pub fn classify(error: &ChainError) -> Self {
        if let ChainError::Rpc(RpcError::Node { code, .. }) = error {
            if *code == 4001 {
                return RevertReason::UserRejected;
            }
        }
        let text = error.to_string();
        if text.contains("NullifierAlreadyUsed") {
            RevertReason::NullifierAlreadyUsed
        } else if text.contains("InvalidWorldIDProof") {
            RevertReason::InvalidProof
        } else if text.to_lowercase().contains("insufficient funds") {
            RevertReason::InsufficientFunds
        } else {
            RevertReason::Unknown(text)
        }
    }

    /// The user-facing message for this classification.
    pub fn user_message(&self) -> String {
        match self {
            RevertReason::NullifierAlreadyUsed => {
                "This proof has already been used. Please verify again to get a fresh proof."
                    .to_string()
            }
            RevertReason::InvalidProof => {
                "Personhood proof verification failed in the contract. Check that the app and \
                 action identifiers match the deployment."
                    .to_string()
            }
            RevertReason::UserRejected => "You rejected the transaction in your wallet.".to_string(),
            RevertReason::InsufficientFunds => {
                "Insufficient funds for gas fees.".to_string()
            }
            RevertReason::Unknown(text) => format!("The contract rejected the post: {text}"),
        }
    }
}

impl std::fmt::Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.user_message())
    }
}

/// Terminal failure of one publish attempt, one variant per workflow exit.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Input validation, before any network call
    #[error("Cannot publish an empty post.")]
    EmptyPost,

    /// Wallet connection or signing-identity failure
    #[error("Wallet connection failed: {0}")]
    Wallet(#[from] WalletError),

    /// Attachment encryption, ciphertext upload, or key custody failure
    #[error("Encrypting and uploading the attachment failed: {0}")]
    EncryptUpload(String),

    /// Metadata document upload failure
    #[error("Uploading post metadata failed: {0}")]
    MetadataUpload(#[from] StorageError),

    #[error("Metadata serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local proof decoding failure, distinct from contract rejection
    #[error("Failed to decode the personhood proof. Please verify again.")]
    ProofDecode(#[from] ProofError),

    /// Advisory preflight found the nullifier consumed
    #[error("This proof has already been used. Please verify again to get a fresh proof.")]
    NullifierAlreadyUsed,

    /// The simulation dry run reverted; no transaction was sent
    #[error("{}", .0.user_message())]
    Rejected(RevertReason),

    /// The submitted transaction failed (rejection at signing, gas,
    /// post-broadcast revert)
    #[error("{}", .0.user_message())]
    Submission(RevertReason),
}

/// Result of a successful publish attempt.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    pub content_hash: ContentHash,
    pub tx_hash: String,
    pub block_number: u64,
}

/// Per-deployment knobs the workflow needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Chain name as the threshold network spells it.
    pub chain: String,
    /// Balance floor (wei, decimal string) for the decrypt predicate.
    pub min_balance_wei: String,
}

/// Orchestrates one publish attempt across the external collaborators.
pub struct PublishWorkflow<'a> {
    contract: &'a dyn ForumContract,
    storage: &'a dyn StorageClient,
    threshold: &'a dyn ThresholdClient,
    wallet: &'a dyn WalletProvider,
    config: WorkflowConfig,
}

impl<'a> PublishWorkflow<'a> {
    pub fn new(
        contract: &'a dyn ForumContract,
        storage: &'a dyn StorageClient,
        threshold: &'a dyn ThresholdClient,
        wallet: &'a dyn WalletProvider,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            contract,
            storage,
            threshold,
            wallet,
            config,
        }
    }

    /// Run the full workflow for one draft and one fresh proof.
    ///
    /// Steps run strictly in order; each network round trip completes
    /// before the next begins. Any failure is terminal for the attempt.
    pub async fn publish(
        &self,
        draft: &PostDraft,
        proof: &IdentityProof,
    ) -> Result<PublishOutcome, PublishError> {
        // Step 1: validate input. No side effects on failure.
        if draft.is_empty() {
            return Err(PublishError::EmptyPost);
        }

        // Step 2: wallet connect.
        let user_address = self.wallet.request_account().await?;
        info!(%user_address, "wallet connected");

        // Step 3: encrypt and upload the attachment, if any.
        let mut metadata = PostMetadata::text_only(&draft.text);
        if let Some(image) = &draft.image {
            let conditions = vec![AccessControlCondition::balance_at_least(
                &self.config.chain,
                &self.config.min_balance_wei,
            )];
            let auth_sig = self.sign_auth(user_address).await?;

            let key = SymmetricKey::generate();
            let ciphertext = encrypt_bytes(&key, &image.bytes)
                .map_err(|e| PublishError::EncryptUpload(e.to_string()))?;
            let image_hash = self
                .storage
                .upload_bytes(&image.name, ciphertext)
                .await
                .map_err(|e| PublishError::EncryptUpload(e.to_string()))?;
            let encrypted_key = self
                .threshold
                .save_encryption_key(&conditions, &key, &auth_sig, &self.config.chain)
                .await
                .map_err(|e| PublishError::EncryptUpload(e.to_string()))?;
            info!(%image_hash, "attachment encrypted and uploaded");

            metadata.encrypted_image_hash = Some(image_hash);
            metadata.encrypted_symmetric_key = Some(encrypted_key);
            metadata.access_control_conditions = Some(conditions);
        }

        // Step 4: upload the metadata document.
        let document = serde_json::to_string(&metadata)?;
        let content_hash = self
            .storage
            .upload_text("post-metadata.json", document)
            .await?;
        info!(%content_hash, "metadata uploaded");

        // Step 5: decode the proof payload, before touching the contract.
        let proof_words = proof.decode()?;

        // Step 6: advisory nullifier preflight. The authoritative check is
        // the on-chain state at submission; a failed lookup here does not
        // stop the attempt.
        match self.contract.is_nullifier_used(proof.nullifier_hash).await {
            Ok(true) => return Err(PublishError::NullifierAlreadyUsed),
            Ok(false) => info!("nullifier unused, proceeding"),
            Err(error) => warn!(%error, "nullifier preflight unavailable, proceeding"),
        }

        let args = PublishArgs {
            content_hash: content_hash.clone(),
            user_address,
            merkle_root: proof.merkle_root,
            nullifier_hash: proof.nullifier_hash,
            proof: proof_words,
        };

        // Step 7: simulate with identical arguments. A revert here means
        // the real transaction is never sent.
        if let Err(error) = self.contract.simulate_publish(&args).await {
            let reason = RevertReason::classify(&error);
            warn!(%reason, "simulation rejected the publish");
            return Err(PublishError::Rejected(reason));
        }
        info!("simulation passed");

        // Step 8: submit and await one confirmation.
        let receipt = self.contract.publish(&args).await.map_err(|error| {
            let reason = RevertReason::classify(&error);
            warn!(%reason, "submission failed");
            PublishError::Submission(reason)
        })?;
        info!(tx_hash = %receipt.tx_hash, block = receipt.block_number, "post published");

        // Step 9: done. The caller clears the draft; the event
        // subscription delivers the post record to the feed.
        Ok(PublishOutcome {
            content_hash,
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        })
    }

    async fn sign_auth(
        &self,
        address: veilforum_core::types::Address,
    ) -> Result<AuthSig, PublishError> {
        let message = format!("VeilForum: authorize key custody for {address}");
        let sig = self
            .wallet
            .sign_message(address, &message)
            .await
            .map_err(|e| PublishError::EncryptUpload(e.to_string()))?;
        Ok(AuthSig {
            sig,
            derived_via: "web3.eth.personal.sign".to_string(),
            signed_message: message,
            address: address.to_string(),
        })
    }
}
