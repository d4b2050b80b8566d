//! Configuration management for VeilForum.
//!
//! One explicit configuration object, passed into constructors; no
//! module-level keys or addresses.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumConfig {
    pub chain: ChainConfig,
    pub storage: StorageConfig,
    pub threshold: ThresholdConfig,
    pub identity: IdentityConfig,
    pub access: AccessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Read-only node endpoint (queries, simulation, logs).
    pub rpc_url: String,
    /// Account-holding wallet endpoint (connect, transaction submission).
    pub wallet_rpc_url: String,
    pub contract_address: String,
    /// Chain name as the threshold network spells it.
    pub chain: String,
    /// Fixed generous limit; proof verification is gas-heavy.
    pub gas_limit: u64,
    /// Event watcher poll interval.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub api_key: String,
    pub api_url: String,
    pub gateway_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Named threshold-decryption network to connect to.
    pub network: String,
    pub api_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub app_id: String,
    pub action: String,
    /// "device" or "orb".
    pub verification_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Minimum balance (wei, decimal string) the decrypt predicate demands.
    pub min_balance_wei: String,
}

impl ForumConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            chain: ChainConfig {
                rpc_url: "https://eth-sepolia.example.org/v2/demo".to_string(),
                wallet_rpc_url: "http://127.0.0.1:8545".to_string(),
                contract_address: "0x14ab6A6685477121d2B091e567bB5E2C092a6ffd".to_string(),
                chain: "sepolia".to_string(),
                gas_limit: 20_000_000,
                poll_interval_ms: 4_000,
            },
            storage: StorageConfig {
                api_key: String::new(),
                api_url: "https://node.lighthouse.storage/api/v0/add".to_string(),
                gateway_url: "https://gateway.lighthouse.storage".to_string(),
            },
            threshold: ThresholdConfig {
                network: "jalapeno".to_string(),
                api_url: "https://node.litgateway.com".to_string(),
            },
            identity: IdentityConfig {
                app_id: "app_staging_f52183479ff75fe3a2cc7b837728d931".to_string(),
                action: "anonymous-news-forum15".to_string(),
                verification_level: "device".to_string(),
            },
            access: AccessConfig {
                min_balance_wei: "100000000000000".to_string(),
            },
        }
    }
}
