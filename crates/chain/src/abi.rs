//! Minimal ABI codec for the forum contract surface.
//!
//! The contract ABI is fixed (see `contract.rs`), so instead of a general
//! codec this module hand-rolls exactly the encodings the client needs:
//! one write call with a single dynamic argument, a handful of single-word
//! reads, the `(uint256, string, uint256)` post record, and the strict
//! `uint256[8]` personhood-proof payload.

use sha3::{Digest, Keccak256};
use thiserror::Error;

use veilforum_core::types::{Address, ContentHash, Post, Uint256};

/// Number of words in a personhood proof payload.
pub const PROOF_WORDS: usize = 8;

/// Byte length of an ABI-encoded `uint256[8]` (no offset, static array).
pub const PROOF_PAYLOAD_BYTES: usize = PROOF_WORDS * 32;

/// ABI codec error types.
#[derive(Debug, Error)]
pub enum AbiError {
    /// Proof payload did not decode to exactly eight words. This is a
    /// local, pre-network failure, distinct from any contract rejection.
    #[error("Invalid proof payload: expected {PROOF_PAYLOAD_BYTES} bytes ({PROOF_WORDS} words), got {0}")]
    BadProofPayload(usize),

    #[error("Malformed hex in ABI data: {0}")]
    BadHex(String),

    #[error("Return data too short: need {needed} bytes, got {got}")]
    ShortData { needed: usize, got: usize },

    #[error("Dynamic offset out of range: {0}")]
    BadOffset(usize),
}

/// Result type for ABI operations.
pub type AbiResult<T> = Result<T, AbiError>;

/// Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Four-byte function selector for a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub const SIG_PUBLISH_POST: &str = "publishPost(string,address,uint256,uint256,uint256[8])";
pub const SIG_POSTS: &str = "posts(uint256)";
pub const SIG_POST_COUNT: &str = "postCount()";
pub const SIG_IS_NULLIFIER_USED: &str = "isNullifierUsed(uint256)";
pub const SIG_GET_APP_ID: &str = "getAppId()";
pub const SIG_GET_ACTION_ID: &str = "getActionId()";
pub const SIG_POST_PUBLISHED: &str = "PostPublished(uint256,string,uint256)";

/// Topic hash of the `PostPublished` event.
pub fn post_published_topic() -> [u8; 32] {
    keccak256(SIG_POST_PUBLISHED.as_bytes())
}

fn word_from_address(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(&address.0);
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(32) * 32
}

fn push_string_tail(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    out.extend_from_slice(&Uint256::from_u64(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
    out.resize(out.len() + (padded_len(bytes.len()) - bytes.len()), 0);
}

/// Calldata for `publishPost(string,address,uint256,uint256,uint256[8])`.
///
/// The content hash string is the only dynamic argument; the head is
/// twelve words (offset, address, root, nullifier, eight proof words)
/// followed by the string tail.
pub fn encode_publish_post(
    content_hash: &ContentHash,
    user_address: Address,
    merkle_root: Uint256,
    nullifier_hash: Uint256,
    proof: &[Uint256; PROOF_WORDS],
) -> Vec<u8> {
    const HEAD_WORDS: usize = 12;

    let mut out = Vec::with_capacity(4 + HEAD_WORDS * 32 + 32 + padded_len(content_hash.0.len()));
    out.extend_from_slice(&selector(SIG_PUBLISH_POST));
    out.extend_from_slice(&Uint256::from_u64((HEAD_WORDS * 32) as u64).to_be_bytes());
    out.extend_from_slice(&word_from_address(user_address));
    out.extend_from_slice(&merkle_root.to_be_bytes());
    out.extend_from_slice(&nullifier_hash.to_be_bytes());
    for word in proof {
        out.extend_from_slice(&word.to_be_bytes());
    }
    push_string_tail(&mut out, &content_hash.0);
    out
}

/// Calldata for a read taking a single `uint256` argument.
pub fn encode_uint256_call(signature: &str, argument: Uint256) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + 32);
    out.extend_from_slice(&selector(signature));
    out.extend_from_slice(&argument.to_be_bytes());
    out
}

/// Calldata for a read taking no arguments.
pub fn encode_nullary_call(signature: &str) -> Vec<u8> {
    selector(signature).to_vec()
}

fn word_at(data: &[u8], index: usize) -> AbiResult<Uint256> {
    let start = index * 32;
    let end = start + 32;
    if data.len() < end {
        return Err(AbiError::ShortData {
            needed: end,
            got: data.len(),
        });
    }
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[start..end]);
    Ok(Uint256(word))
}

/// Decode a single `uint256` return value.
pub fn decode_uint256(data: &[u8]) -> AbiResult<Uint256> {
    word_at(data, 0)
}

/// Decode a single `bool` return value (any nonzero word is true).
pub fn decode_bool(data: &[u8]) -> AbiResult<bool> {
    Ok(!word_at(data, 0)?.is_zero())
}

fn decode_string_at(data: &[u8], offset: usize) -> AbiResult<String> {
    if offset % 32 != 0 || offset + 32 > data.len() {
        return Err(AbiError::BadOffset(offset));
    }
    let length = word_at(data, offset / 32)?
        .as_u64()
        .ok_or(AbiError::BadOffset(offset))? as usize;
    let start = offset + 32;
    let end = start + length;
    if data.len() < end {
        return Err(AbiError::ShortData {
            needed: end,
            got: data.len(),
        });
    }
    String::from_utf8(data[start..end].to_vec())
        .map_err(|_| AbiError::BadHex("content hash is not UTF-8".to_string()))
}

/// Decode the `(uint256 id, string ipfsHash, uint256 anonymousAuthorId)`
/// record returned by `posts(uint256)` and carried in `PostPublished` event
/// data (the event has no indexed parameters, so the layouts coincide).
pub fn decode_post_record(data: &[u8]) -> AbiResult<Post> {
    let id = word_at(data, 0)?;
    let string_offset = word_at(data, 1)?
        .as_u64()
        .ok_or(AbiError::BadOffset(usize::MAX))? as usize;
    let author_id = word_at(data, 2)?;
    let content_hash = decode_string_at(data, string_offset)?;
    Ok(Post {
        id: id.as_u64().unwrap_or(u64::MAX),
        content_hash: ContentHash(content_hash),
        author_id,
    })
}

/// Encode a post record in the `posts(uint256)` return layout.
///
/// The contract is the only producer in deployment; this exists for test
/// fixtures.
pub fn encode_post_record(post: &Post) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&Uint256::from_u64(post.id).to_be_bytes());
    out.extend_from_slice(&Uint256::from_u64(96).to_be_bytes());
    out.extend_from_slice(&post.author_id.to_be_bytes());
    push_string_tail(&mut out, &post.content_hash.0);
    out
}

/// Decode an opaque proof payload into the eight words the contract takes.
///
/// Strict: after stripping the `0x` prefix the payload must decode to
/// exactly [`PROOF_PAYLOAD_BYTES`] bytes. Anything else fails here, before
/// any network call is attempted.
pub fn decode_proof_payload(payload: &str) -> AbiResult<[Uint256; PROOF_WORDS]> {
    let stripped = payload.strip_prefix("0x").unwrap_or(payload);
    let bytes = hex::decode(stripped).map_err(|e| AbiError::BadHex(e.to_string()))?;
    if bytes.len() != PROOF_PAYLOAD_BYTES {
        return Err(AbiError::BadProofPayload(bytes.len()));
    }
    let mut words = [Uint256::ZERO; PROOF_WORDS];
    for (i, word) in words.iter_mut().enumerate() {
        let mut buf = [0u8; 32];
        buf.copy_from_slice(&bytes[i * 32..(i + 1) * 32]);
        *word = Uint256(buf);
    }
    Ok(words)
}
