//! `PostPublished` event watcher.
//!
//! Polls `eth_getLogs` on an interval and forwards decoded posts into a
//! channel. The watcher task is torn down when the `Subscription` is
//! dropped, so no listener outlives its consumer. Duplicate delivery is
//! possible across poll windows; the feed de-duplicates by post id.

use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use veilforum_core::types::{Address, Post};

use crate::abi;
use crate::error::{ChainError, ChainResult};
use crate::rpc::{data_to_bytes, quantity_to_u64, RpcClient};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// A live subscription to `PostPublished` events.
///
/// Dropping the subscription aborts the watcher task.
pub struct Subscription {
    receiver: mpsc::Receiver<Post>,
    handle: JoinHandle<()>,
}

impl Subscription {
    /// Receive the next event; `None` once the watcher has stopped.
    pub async fn recv(&mut self) -> Option<Post> {
        self.receiver.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns and owns the polling task.
pub struct EventWatcher {
    rpc: RpcClient,
    contract: Address,
    poll_interval: Duration,
}

impl EventWatcher {
    pub fn new(rpc: RpcClient, contract: Address, poll_interval: Duration) -> Self {
        Self {
            rpc,
            contract,
            poll_interval,
        }
    }

    /// Start watching from the current head. The block window is anchored
    /// before this returns, so anything mined after the call is delivered;
    /// callers subscribe before their initial read and let the feed drop
    /// the overlap. Must be called before any write so the resulting
    /// post's own event is observed.
    pub async fn subscribe(&self) -> ChainResult<Subscription> {
        let head = quantity_to_u64(&self.rpc.call("eth_blockNumber", json!([])).await?)?;
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let rpc = self.rpc.clone();
        let contract = self.contract;
        let poll_interval = self.poll_interval;

        let handle = tokio::spawn(async move {
            let topic = format!("0x{}", hex::encode(abi::post_published_topic()));
            let mut from_block = head + 1;
            loop {
                if let Err(error) =
                    poll_once(&rpc, contract, &topic, &mut from_block, &sender).await
                {
                    warn!(%error, "event poll failed, will retry");
                }
                if sender.is_closed() {
                    return;
                }
                tokio::time::sleep(poll_interval).await;
            }
        });

        Ok(Subscription { receiver, handle })
    }
}

/// The inclusive block range the next `eth_getLogs` query should cover,
/// or `None` when no new block has arrived since the last poll.
fn log_window(from_block: u64, head: u64) -> Option<(u64, u64)> {
    if head < from_block {
        None
    } else {
        Some((from_block, head))
    }
}

async fn poll_once(
    rpc: &RpcClient,
    contract: Address,
    topic: &str,
    from_block: &mut u64,
    sender: &mpsc::Sender<Post>,
) -> Result<(), ChainError> {
    let head = quantity_to_u64(&rpc.call("eth_blockNumber", json!([])).await?)?;
    let Some((from, head)) = log_window(*from_block, head) else {
        return Ok(());
    };

    let logs = rpc
        .call(
            "eth_getLogs",
            json!([{
                "address": contract.to_string(),
                "topics": [topic],
                "fromBlock": format!("0x{from:x}"),
                "toBlock": format!("0x{head:x}"),
            }]),
        )
        .await?;

    if let Some(entries) = logs.as_array() {
        for entry in entries {
            let data = match entry.get("data").map(data_to_bytes) {
                Some(Ok(data)) => data,
                _ => {
                    warn!("skipping log with unreadable data");
                    continue;
                }
            };
            match abi::decode_post_record(&data) {
                Ok(post) => {
                    debug!(id = post.id, "PostPublished event");
                    if sender.send(post).await.is_err() {
                        // Consumer gone; stop forwarding.
                        return Ok(());
                    }
                }
                Err(error) => warn!(%error, "skipping undecodable PostPublished log"),
            }
        }
    }

    *from_block = head + 1;
    Ok(())
}
