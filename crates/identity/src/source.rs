//! The widget seam.

use async_trait::async_trait;

use crate::proof::{IdentityProof, ProofError, WidgetConfig};

/// Source of personhood proofs (dependency injection).
///
/// In deployment this is backed by the external identity widget: the user
/// completes verification and the widget yields `{merkle_root,
/// nullifier_hash, proof}`. Tests substitute stubs.
#[async_trait]
pub trait ProofSource: Send + Sync {
    /// Collect one proof for the configured app and action. Each proof is
    /// single-use; a new publish attempt needs a fresh call.
    async fn collect_proof(&self, config: &WidgetConfig) -> Result<IdentityProof, ProofError>;
}
