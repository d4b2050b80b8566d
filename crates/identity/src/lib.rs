//! Personhood proof handling.
//!
//! The proof itself is produced by an external identity widget; this crate
//! owns the proof's local representation, its strict decoding into the
//! contract's eight-word form, and the seam through which a widget (or a
//! test stub) delivers proofs.

pub mod proof;
pub mod source;

pub use proof::{
    identifier_hash, DecodedProof, IdentityProof, ProofError, VerificationLevel, WidgetConfig,
};
pub use source::ProofSource;
