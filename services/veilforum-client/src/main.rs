//! Feed-tailing client: loads the configured deployment, prints the
//! current feed, then follows live `PostPublished` events until Ctrl-C.

use std::time::Duration;

use tracing::{info, warn};

use veilforum_chain::contract::HttpForumContract;
use veilforum_chain::events::EventWatcher;
use veilforum_chain::rpc::RpcClient;
use veilforum_chain::wallet::RpcWallet;
use veilforum_core::config::ForumConfig;
use veilforum_core::logging;
use veilforum_core::types::{Address, Post};
use veilforum_forum::diagnostic::run_identifier_diagnostic;
use veilforum_forum::feed::{Feed, FeedRenderer};
use veilforum_storage::client::HttpStorageClient;
use veilforum_threshold::client::HttpThresholdClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ForumConfig::from_file(path)?,
        None => ForumConfig::default_config(),
    };
    let contract_address = Address::from_hex(&config.chain.contract_address)
        .map_err(|e| anyhow::anyhow!("bad contract address in config: {e}"))?;

    let node = RpcClient::new(config.chain.rpc_url.clone());
    let wallet_rpc = RpcClient::new(config.chain.wallet_rpc_url.clone());
    let contract = HttpForumContract::new(
        node.clone(),
        wallet_rpc.clone(),
        contract_address,
        config.chain.gas_limit,
    );
    let storage = HttpStorageClient::new(config.storage.clone());
    let threshold = HttpThresholdClient::new(config.threshold.clone());
    let wallet = RpcWallet::new(wallet_rpc);

    info!(contract = %contract_address, chain = %config.chain.chain, "client starting");

    if !run_identifier_diagnostic(&contract, &config.identity.app_id, &config.identity.action)
        .await?
    {
        warn!("continuing despite identifier mismatch (diagnostic is advisory)");
    }

    // Subscribe before any reads so nothing published mid-load is missed.
    let watcher = EventWatcher::new(
        node,
        contract_address,
        Duration::from_millis(config.chain.poll_interval_ms),
    );
    let mut subscription = watcher.subscribe().await?;

    let renderer = FeedRenderer::new(&storage, &threshold, &wallet, config.chain.chain.clone());
    let mut feed = Feed::load_initial(&contract).await?;
    info!(posts = feed.len(), "feed loaded");
    for post in feed.posts() {
        print_post(&renderer, post).await;
    }

    loop {
        tokio::select! {
            maybe_post = subscription.recv() => {
                match maybe_post {
                    Some(post) => {
                        if feed.apply_event(post.clone()) {
                            print_post(&renderer, &post).await;
                        }
                    }
                    None => {
                        warn!("event subscription closed");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

async fn print_post(renderer: &FeedRenderer<'_>, post: &Post) {
    match renderer.metadata(post).await {
        Ok(metadata) => {
            let attachment = if metadata.encrypted_image_hash.is_some() {
                " [encrypted attachment]"
            } else {
                ""
            };
            println!(
                "#{} (author {}) {}{attachment}",
                post.id, post.author_id, metadata.text
            );
        }
        Err(error) => {
            warn!(id = post.id, %error, "could not fetch post metadata");
            println!("#{} (author {}) <metadata unavailable>", post.id, post.author_id);
        }
    }
}
