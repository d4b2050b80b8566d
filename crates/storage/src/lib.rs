//! Content-addressed storage client.
//!
//! Uploads go through the network's API-key-authenticated add endpoint and
//! come back as a content identifier; reads go through the public gateway
//! at `GET /ipfs/{hash}`. The network derives identifiers from content
//! bytes; this client treats them as opaque.

pub mod client;

pub use client::{HttpStorageClient, StorageClient, StorageError, StorageResult};
