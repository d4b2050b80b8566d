//! Startup consistency check between the configured identifiers and the
//! contract's stored hashes. Logged, never blocking: a mismatch means
//! every proof will fail verification in the contract, and the operator
//! should know before the first user does.

use tracing::{info, warn};

use veilforum_chain::contract::ForumContract;
use veilforum_chain::error::ChainResult;
use veilforum_identity::proof::identifier_hash;

/// Compare the contract's app and action identifier hashes against the
/// locally configured strings. Returns whether both match.
pub async fn run_identifier_diagnostic(
    contract: &dyn ForumContract,
    app_id: &str,
    action: &str,
) -> ChainResult<bool> {
    let contract_app = contract.app_id_hash().await?;
    let contract_action = contract.action_id_hash().await?;
    let expected_app = identifier_hash(app_id);
    let expected_action = identifier_hash(action);

    let app_matches = contract_app == expected_app;
    let action_matches = contract_action == expected_action;

    if app_matches && action_matches {
        info!("contract identifier diagnostic passed");
    } else {
        warn!(
            app_matches,
            action_matches,
            %contract_app,
            %expected_app,
            %contract_action,
            %expected_action,
            "contract identifiers do not match local configuration; proofs will be rejected"
        );
    }
    Ok(app_matches && action_matches)
}
