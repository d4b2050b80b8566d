//! On-chain contract binding for the VeilForum forum contract.
//!
//! This crate owns everything that touches the node: a minimal ABI codec
//! for the fixed contract surface, a JSON-RPC transport, the read/write
//! contract handle, the `PostPublished` event watcher, and the wallet seam
//! through which transactions are signed.

pub mod abi;
pub mod contract;
pub mod error;
pub mod events;
pub mod rpc;
pub mod wallet;

pub use abi::AbiError;
pub use contract::{ForumContract, HttpForumContract, PublishArgs, TxReceipt};
pub use error::{ChainError, ChainResult, WalletError};
pub use events::{EventWatcher, Subscription};
pub use rpc::{RpcClient, RpcError};
pub use wallet::{RpcWallet, WalletProvider};
