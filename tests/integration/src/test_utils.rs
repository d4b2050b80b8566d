//! Mock collaborators for workflow and feed tests.
//!
//! Each mock counts its calls so tests can assert exactly which network
//! round trips a scenario performs -- including the scenarios whose whole
//! point is that no call happens at all.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use veilforum_chain::contract::{ForumContract, PublishArgs, TxReceipt};
use veilforum_chain::error::{ChainError, ChainResult, WalletError};
use veilforum_chain::rpc::RpcError;
use veilforum_chain::wallet::WalletProvider;
use veilforum_core::types::{Address, ContentHash, Post, Uint256};
use veilforum_identity::proof::IdentityProof;
use veilforum_storage::client::{StorageClient, StorageError, StorageResult};
use veilforum_threshold::cipher::SymmetricKey;
use veilforum_threshold::client::{AuthSig, ThresholdClient, ThresholdError, ThresholdResult};
use veilforum_forum::workflow::WorkflowConfig;

pub fn workflow_config() -> WorkflowConfig {
    WorkflowConfig {
        chain: "sepolia".to_string(),
        min_balance_wei: "100000000000000".to_string(),
    }
}

/// A structurally valid eight-word proof with the given nullifier.
pub fn proof_with_nullifier(nullifier: u64) -> IdentityProof {
    IdentityProof {
        merkle_root: Uint256::from_u64(0xabc),
        nullifier_hash: Uint256::from_u64(nullifier),
        proof: format!("0x{}", "22".repeat(8 * 32)),
    }
}

/// A proof whose payload decodes to seven words instead of eight.
pub fn truncated_proof() -> IdentityProof {
    IdentityProof {
        proof: format!("0x{}", "22".repeat(7 * 32)),
        ..proof_with_nullifier(1)
    }
}

fn revert(reason: &str) -> ChainError {
    ChainError::Rpc(RpcError::Node {
        code: 3,
        message: "execution reverted".to_string(),
        data: Some(format!("{reason}()")),
    })
}

/// How the mock answers the advisory nullifier preflight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightBehavior {
    /// Answer from the recorded nullifier set
    FromState,
    /// The lookup itself fails (node unreachable)
    Unavailable,
}

#[derive(Default)]
struct ContractState {
    posts: Vec<Post>,
    used_nullifiers: Vec<Uint256>,
}

/// In-memory stand-in for the deployed contract.
///
/// Enforces the on-chain invariants the tests rely on: 1-based gap-free
/// ids and at most one successful publish per nullifier.
pub struct MockContract {
    state: Mutex<ContractState>,
    pub preflight: PreflightBehavior,
    /// Forced simulation failure reason (contract custom error name).
    pub simulate_failure: Option<String>,
    pub post_count_calls: AtomicUsize,
    pub post_calls: AtomicUsize,
    pub preflight_calls: AtomicUsize,
    pub simulate_calls: AtomicUsize,
    pub publish_calls: AtomicUsize,
}

impl MockContract {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ContractState::default()),
            preflight: PreflightBehavior::FromState,
            simulate_failure: None,
            post_count_calls: AtomicUsize::new(0),
            post_calls: AtomicUsize::new(0),
            preflight_calls: AtomicUsize::new(0),
            simulate_calls: AtomicUsize::new(0),
            publish_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_preflight(preflight: PreflightBehavior) -> Self {
        Self {
            preflight,
            ..Self::new()
        }
    }

    pub fn with_simulate_failure(reason: &str) -> Self {
        Self {
            simulate_failure: Some(reason.to_string()),
            ..Self::new()
        }
    }

    /// Pre-mark a nullifier as consumed.
    pub fn mark_nullifier_used(&self, nullifier: Uint256) {
        self.state.lock().unwrap().used_nullifiers.push(nullifier);
    }

    /// Posts in publication order, as the chain holds them.
    pub fn published_posts(&self) -> Vec<Post> {
        self.state.lock().unwrap().posts.clone()
    }

    pub fn total_contract_calls(&self) -> usize {
        self.post_count_calls.load(Ordering::SeqCst)
            + self.post_calls.load(Ordering::SeqCst)
            + self.preflight_calls.load(Ordering::SeqCst)
            + self.simulate_calls.load(Ordering::SeqCst)
            + self.publish_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockContract {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForumContract for MockContract {
    async fn post_count(&self) -> ChainResult<u64> {
        self.post_count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().posts.len() as u64)
    }

    async fn post(&self, id: u64) -> ChainResult<Post> {
        self.post_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        state
            .posts
            .get((id as usize).wrapping_sub(1))
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse(format!("no post {id}")))
    }

    async fn is_nullifier_used(&self, nullifier_hash: Uint256) -> ChainResult<bool> {
        self.preflight_calls.fetch_add(1, Ordering::SeqCst);
        match self.preflight {
            PreflightBehavior::FromState => Ok(self
                .state
                .lock()
                .unwrap()
                .used_nullifiers
                .contains(&nullifier_hash)),
            PreflightBehavior::Unavailable => Err(ChainError::Rpc(RpcError::Node {
                code: -32000,
                message: "node unreachable".to_string(),
                data: None,
            })),
        }
    }

    async fn app_id_hash(&self) -> ChainResult<Uint256> {
        Ok(Uint256::from_u64(1))
    }

    async fn action_id_hash(&self) -> ChainResult<Uint256> {
        Ok(Uint256::from_u64(2))
    }

    async fn simulate_publish(&self, args: &PublishArgs) -> ChainResult<()> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.simulate_failure {
            return Err(revert(reason));
        }
        let state = self.state.lock().unwrap();
        if state.used_nullifiers.contains(&args.nullifier_hash) {
            return Err(revert("NullifierAlreadyUsed"));
        }
        Ok(())
    }

    async fn publish(&self, args: &PublishArgs) -> ChainResult<TxReceipt> {
        self.publish_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        if state.used_nullifiers.contains(&args.nullifier_hash) {
            return Err(revert("NullifierAlreadyUsed"));
        }
        let id = state.posts.len() as u64 + 1;
        state.posts.push(Post {
            id,
            content_hash: args.content_hash.clone(),
            // The real contract derives this from the proof; the nullifier
            // is a stable stand-in.
            author_id: args.nullifier_hash,
        });
        state.used_nullifiers.push(args.nullifier_hash);
        Ok(TxReceipt {
            tx_hash: format!("0xtx{id:04}"),
            block_number: 100 + id,
        })
    }
}

/// In-memory content store handing out sequential identifiers.
pub struct MockStorage {
    documents: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicUsize,
    pub fail_uploads: bool,
    pub upload_bytes_calls: AtomicUsize,
    pub upload_text_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            documents: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            fail_uploads: false,
            upload_bytes_calls: AtomicUsize::new(0),
            upload_text_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new()
        }
    }

    pub fn total_uploads(&self) -> usize {
        self.upload_bytes_calls.load(Ordering::SeqCst)
            + self.upload_text_calls.load(Ordering::SeqCst)
    }

    pub fn document(&self, hash: &ContentHash) -> Option<Vec<u8>> {
        self.documents.lock().unwrap().get(hash.as_str()).cloned()
    }

    fn store(&self, bytes: Vec<u8>) -> StorageResult<ContentHash> {
        if self.fail_uploads {
            return Err(StorageError::UploadRejected {
                status: 500,
                body: "mock upload failure".to_string(),
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let hash = format!("QmMock{id:04}");
        self.documents.lock().unwrap().insert(hash.clone(), bytes);
        Ok(ContentHash(hash))
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageClient for MockStorage {
    async fn upload_bytes(&self, _name: &str, bytes: Vec<u8>) -> StorageResult<ContentHash> {
        self.upload_bytes_calls.fetch_add(1, Ordering::SeqCst);
        self.store(bytes)
    }

    async fn upload_text(&self, _name: &str, text: String) -> StorageResult<ContentHash> {
        self.upload_text_calls.fetch_add(1, Ordering::SeqCst);
        self.store(text.into_bytes())
    }

    async fn fetch(&self, hash: &ContentHash) -> StorageResult<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.document(hash).ok_or_else(|| StorageError::Gateway {
            status: 404,
            hash: hash.to_string(),
        })
    }
}

/// Key custody mock: stores keys by blob id, optionally denying release.
pub struct MockThreshold {
    keys: Mutex<HashMap<String, Vec<u8>>>,
    next_id: AtomicUsize,
    pub deny_release: bool,
    pub save_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
}

impl MockThreshold {
    pub fn new() -> Self {
        Self {
            keys: Mutex::new(HashMap::new()),
            next_id: AtomicUsize::new(1),
            deny_release: false,
            save_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
        }
    }

    pub fn denying() -> Self {
        Self {
            deny_release: true,
            ..Self::new()
        }
    }
}

impl Default for MockThreshold {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ThresholdClient for MockThreshold {
    async fn save_encryption_key(
        &self,
        _conditions: &[veilforum_core::types::AccessControlCondition],
        key: &SymmetricKey,
        _auth_sig: &AuthSig,
        _chain: &str,
    ) -> ThresholdResult<String> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let blob = format!("blob{id:04}");
        self.keys
            .lock()
            .unwrap()
            .insert(blob.clone(), key.as_bytes().to_vec());
        Ok(blob)
    }

    async fn get_encryption_key(
        &self,
        _conditions: &[veilforum_core::types::AccessControlCondition],
        encrypted_key: &str,
        _chain: &str,
        _auth_sig: &AuthSig,
    ) -> ThresholdResult<SymmetricKey> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.deny_release {
            return Err(ThresholdError::AccessDenied);
        }
        let keys = self.keys.lock().unwrap();
        let bytes = keys
            .get(encrypted_key)
            .ok_or(ThresholdError::AccessDenied)?;
        SymmetricKey::from_bytes(bytes).map_err(|e| ThresholdError::InvalidKey(e.to_string()))
    }
}

/// Wallet mock with a fixed account.
pub struct MockWallet {
    pub account: Address,
    pub reject: bool,
    pub request_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
}

impl MockWallet {
    pub fn new() -> Self {
        Self {
            account: Address([0x42; 20]),
            reject: false,
            request_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::new()
        }
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_account(&self) -> Result<Address, WalletError> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(WalletError::Rejected);
        }
        Ok(self.account)
    }

    async fn sign_message(
        &self,
        _address: Address,
        message: &str,
    ) -> Result<String, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err(WalletError::Rejected);
        }
        Ok(format!("0xsig-{}", message.len()))
    }
}
