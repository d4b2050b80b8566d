//! Threshold-decryption network client and local symmetric cipher.
//!
//! Images are encrypted client-side with a fresh symmetric key; the key is
//! then placed in custody of the threshold network under an access-control
//! predicate. Readers who satisfy the predicate get the key back; nobody
//! else does, and the network does not say which clause failed.

pub mod cipher;
pub mod client;

pub use cipher::{decrypt_bytes, encrypt_bytes, CipherError, SymmetricKey};
pub use client::{AuthSig, HttpThresholdClient, ThresholdClient, ThresholdError, ThresholdResult};
