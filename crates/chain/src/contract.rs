//! Read/write handle to the forum contract.
//!
//! The deployed contract exposes a fixed surface:
//!
//! ```text
//! function publishPost(string ipfsHash, address userAddress, uint256 root,
//!                      uint256 nullifierHash, uint256[8] proof) external
//! function posts(uint256) external view returns (uint256, string, uint256)
//! function postCount() external view returns (uint256)
//! function isNullifierUsed(uint256) external view returns (bool)
//! function getAppId() external view returns (uint256)
//! function getActionId() external view returns (uint256)
//! event PostPublished(uint256 id, string ipfsHash, uint256 anonymousAuthorId)
//! ```
//!
//! `ForumContract` is the seam the publish workflow is written against;
//! tests substitute mock implementations (dependency injection).

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use veilforum_core::types::{Address, ContentHash, Post, Uint256};

use crate::abi::{self, PROOF_WORDS};
use crate::error::{ChainError, ChainResult};
use crate::rpc::{data_to_bytes, quantity_to_u64, RpcClient};

/// Arguments of one `publishPost` call. Simulation and submission must use
/// the same values, so they travel together.
#[derive(Debug, Clone)]
pub struct PublishArgs {
    pub content_hash: ContentHash,
    pub user_address: Address,
    pub merkle_root: Uint256,
    pub nullifier_hash: Uint256,
    pub proof: [Uint256; PROOF_WORDS],
}

impl PublishArgs {
    fn calldata(&self) -> Vec<u8> {
        abi::encode_publish_post(
            &self.content_hash,
            self.user_address,
            self.merkle_root,
            self.nullifier_hash,
            &self.proof,
        )
    }
}

/// Receipt of a confirmed transaction.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
}

/// Read/write contract handle.
#[async_trait]
pub trait ForumContract: Send + Sync {
    async fn post_count(&self) -> ChainResult<u64>;

    async fn post(&self, id: u64) -> ChainResult<Post>;

    async fn is_nullifier_used(&self, nullifier_hash: Uint256) -> ChainResult<bool>;

    async fn app_id_hash(&self) -> ChainResult<Uint256>;

    async fn action_id_hash(&self) -> ChainResult<Uint256>;

    /// Dry-run `publishPost` with the exact submission arguments. A revert
    /// surfaces as an error carrying the node's reason text; no state
    /// changes either way.
    async fn simulate_publish(&self, args: &PublishArgs) -> ChainResult<()>;

    /// Submit `publishPost` through the wallet endpoint and wait for one
    /// confirmation. No reorg handling beyond that.
    async fn publish(&self, args: &PublishArgs) -> ChainResult<TxReceipt>;
}

/// Contract handle over JSON-RPC.
///
/// Reads and simulation go to the node endpoint; the state-changing call
/// goes to the wallet endpoint, which holds the signing account.
pub struct HttpForumContract {
    node: RpcClient,
    wallet: RpcClient,
    address: Address,
    gas_limit: u64,
    receipt_poll_interval: Duration,
    receipt_poll_attempts: u32,
}

impl HttpForumContract {
    pub fn new(node: RpcClient, wallet: RpcClient, address: Address, gas_limit: u64) -> Self {
        Self {
            node,
            wallet,
            address,
            gas_limit,
            receipt_poll_interval: Duration::from_secs(2),
            receipt_poll_attempts: 150,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn node_client(&self) -> RpcClient {
        self.node.clone()
    }

    async fn eth_call(&self, calldata: Vec<u8>) -> ChainResult<Vec<u8>> {
        let result = self
            .node
            .call(
                "eth_call",
                json!([
                    { "to": self.address.to_string(), "data": format!("0x{}", hex::encode(calldata)) },
                    "latest"
                ]),
            )
            .await?;
        Ok(data_to_bytes(&result)?)
    }

    async fn wait_for_receipt(&self, tx_hash: &str) -> ChainResult<TxReceipt> {
        for _ in 0..self.receipt_poll_attempts {
            let receipt = self
                .node
                .call("eth_getTransactionReceipt", json!([tx_hash]))
                .await?;
            if receipt.is_null() {
                tokio::time::sleep(self.receipt_poll_interval).await;
                continue;
            }
            let status = receipt
                .get("status")
                .map(quantity_to_u64)
                .transpose()?
                .unwrap_or(0);
            if status == 0 {
                return Err(ChainError::Reverted {
                    tx_hash: tx_hash.to_string(),
                });
            }
            let block_number = receipt
                .get("blockNumber")
                .map(quantity_to_u64)
                .transpose()?
                .unwrap_or(0);
            return Ok(TxReceipt {
                tx_hash: tx_hash.to_string(),
                block_number,
            });
        }
        Err(ChainError::ConfirmationTimeout {
            tx_hash: tx_hash.to_string(),
        })
    }
}

#[async_trait]
impl ForumContract for HttpForumContract {
    async fn post_count(&self) -> ChainResult<u64> {
        let data = self
            .eth_call(abi::encode_nullary_call(abi::SIG_POST_COUNT))
            .await?;
        abi::decode_uint256(&data)?
            .as_u64()
            .ok_or_else(|| ChainError::InvalidResponse("postCount does not fit u64".to_string()))
    }

    async fn post(&self, id: u64) -> ChainResult<Post> {
        let data = self
            .eth_call(abi::encode_uint256_call(
                abi::SIG_POSTS,
                Uint256::from_u64(id),
            ))
            .await?;
        Ok(abi::decode_post_record(&data)?)
    }

    async fn is_nullifier_used(&self, nullifier_hash: Uint256) -> ChainResult<bool> {
        let data = self
            .eth_call(abi::encode_uint256_call(
                abi::SIG_IS_NULLIFIER_USED,
                nullifier_hash,
            ))
            .await?;
        Ok(abi::decode_bool(&data)?)
    }

    async fn app_id_hash(&self) -> ChainResult<Uint256> {
        let data = self
            .eth_call(abi::encode_nullary_call(abi::SIG_GET_APP_ID))
            .await?;
        Ok(abi::decode_uint256(&data)?)
    }

    async fn action_id_hash(&self) -> ChainResult<Uint256> {
        let data = self
            .eth_call(abi::encode_nullary_call(abi::SIG_GET_ACTION_ID))
            .await?;
        Ok(abi::decode_uint256(&data)?)
    }

    async fn simulate_publish(&self, args: &PublishArgs) -> ChainResult<()> {
        debug!(content_hash = %args.content_hash, "simulating publishPost");
        self.eth_call(args.calldata()).await?;
        Ok(())
    }

    async fn publish(&self, args: &PublishArgs) -> ChainResult<TxReceipt> {
        let result = self
            .wallet
            .call(
                "eth_sendTransaction",
                json!([{
                    "from": args.user_address.to_string(),
                    "to": self.address.to_string(),
                    "gas": format!("0x{:x}", self.gas_limit),
                    "data": format!("0x{}", hex::encode(args.calldata())),
                }]),
            )
            .await?;
        let tx_hash = result
            .as_str()
            .ok_or_else(|| ChainError::InvalidResponse(format!("bad tx hash: {result}")))?
            .to_string();
        info!(%tx_hash, "transaction broadcast, awaiting confirmation");
        self.wait_for_receipt(&tx_hash).await
    }
}
