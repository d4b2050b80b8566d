//! Core functionality for the VeilForum anonymous publishing client.
//!
//! This crate provides the fundamental types, configuration, and utilities
//! used across the VeilForum workspace.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    AccessConfig, ChainConfig, ForumConfig, IdentityConfig, StorageConfig, ThresholdConfig,
};
pub use error::{CoreError, CoreResult};
pub use types::{
    AccessControlCondition, Address, ContentHash, Post, PostMetadata, ReturnValueTest, Uint256,
};
