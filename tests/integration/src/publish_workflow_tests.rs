//! End-to-end publish workflow scenarios against mock collaborators.

use std::sync::atomic::Ordering;

use veilforum_core::types::PostMetadata;
use veilforum_forum::draft::{ImageAttachment, PostDraft};
use veilforum_forum::workflow::{PublishError, PublishWorkflow, RevertReason};

use crate::test_utils::*;

struct Harness {
    contract: MockContract,
    storage: MockStorage,
    threshold: MockThreshold,
    wallet: MockWallet,
}

impl Harness {
    fn new() -> Self {
        Self {
            contract: MockContract::new(),
            storage: MockStorage::new(),
            threshold: MockThreshold::new(),
            wallet: MockWallet::new(),
        }
    }

    fn workflow(&self) -> PublishWorkflow<'_> {
        PublishWorkflow::new(
            &self.contract,
            &self.storage,
            &self.threshold,
            &self.wallet,
            workflow_config(),
        )
    }
}

fn image() -> ImageAttachment {
    ImageAttachment {
        name: "evidence.jpg".to_string(),
        bytes: vec![0xff, 0xd8, 0xff, 0xe0, 1, 2, 3, 4],
    }
}

#[tokio::test]
async fn empty_post_halts_before_any_network_call() {
    let harness = Harness::new();
    let result = harness
        .workflow()
        .publish(&PostDraft::default(), &proof_with_nullifier(1))
        .await;

    assert!(matches!(result, Err(PublishError::EmptyPost)));
    assert_eq!(
        result.unwrap_err().to_string(),
        "Cannot publish an empty post."
    );
    assert_eq!(harness.wallet.request_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.storage.total_uploads(), 0);
    assert_eq!(harness.threshold.save_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.contract.total_contract_calls(), 0);
}

#[tokio::test]
async fn text_only_happy_path_makes_exactly_one_upload() {
    let harness = Harness::new();
    let outcome = harness
        .workflow()
        .publish(&PostDraft::text_only("breaking news"), &proof_with_nullifier(1))
        .await
        .unwrap();

    assert_eq!(harness.storage.upload_bytes_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.storage.upload_text_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.threshold.save_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.contract.simulate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.contract.publish_calls.load(Ordering::SeqCst), 1);

    // The stored metadata document is the text-only shape.
    let bytes = harness.storage.document(&outcome.content_hash).unwrap();
    let metadata: PostMetadata = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(metadata.text, "breaking news");
    assert!(metadata.encrypted_image_hash.is_none());

    let posts = harness.contract.published_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].id, 1);
    assert_eq!(posts[0].content_hash, outcome.content_hash);
}

#[tokio::test]
async fn image_happy_path_counts_every_collaborator_once() {
    let harness = Harness::new();
    let draft = PostDraft::with_image("with proof attached", image());
    let outcome = harness
        .workflow()
        .publish(&draft, &proof_with_nullifier(7))
        .await
        .unwrap();

    // Exactly one ciphertext upload, one metadata upload, one key custody
    // registration, one simulation, one submission.
    assert_eq!(harness.storage.upload_bytes_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.storage.upload_text_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.threshold.save_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.contract.simulate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.contract.publish_calls.load(Ordering::SeqCst), 1);

    let bytes = harness.storage.document(&outcome.content_hash).unwrap();
    let metadata: PostMetadata = serde_json::from_slice(&bytes).unwrap();
    let image_hash = metadata.encrypted_image_hash.unwrap();
    assert!(metadata.encrypted_symmetric_key.is_some());
    let conditions = metadata.access_control_conditions.unwrap();
    assert_eq!(conditions[0].method, "eth_getBalance");

    // The uploaded image blob is ciphertext, not the plaintext.
    let stored_image = harness.storage.document(&image_hash).unwrap();
    assert_ne!(stored_image, image().bytes);
}

#[tokio::test]
async fn wallet_rejection_stops_before_any_upload() {
    let harness = Harness {
        wallet: MockWallet::rejecting(),
        ..Harness::new()
    };
    let result = harness
        .workflow()
        .publish(&PostDraft::text_only("x"), &proof_with_nullifier(1))
        .await;

    assert!(matches!(result, Err(PublishError::Wallet(_))));
    assert_eq!(harness.storage.total_uploads(), 0);
    assert_eq!(harness.contract.total_contract_calls(), 0);
}

#[tokio::test]
async fn upload_failure_is_terminal_without_submission() {
    let harness = Harness {
        storage: MockStorage::failing(),
        ..Harness::new()
    };
    let result = harness
        .workflow()
        .publish(&PostDraft::text_only("x"), &proof_with_nullifier(1))
        .await;

    assert!(matches!(result, Err(PublishError::MetadataUpload(_))));
    assert_eq!(harness.contract.simulate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.contract.publish_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn truncated_proof_fails_before_any_contract_call() {
    let harness = Harness::new();
    let result = harness
        .workflow()
        .publish(&PostDraft::text_only("x"), &truncated_proof())
        .await;

    assert!(matches!(result, Err(PublishError::ProofDecode(_))));
    // Decoding happens after the metadata upload but before the contract
    // is ever touched.
    assert_eq!(harness.contract.total_contract_calls(), 0);
}

#[tokio::test]
async fn used_nullifier_halts_before_simulate_and_submit() {
    let harness = Harness::new();
    let proof = proof_with_nullifier(9);
    harness.contract.mark_nullifier_used(proof.nullifier_hash);

    let result = harness
        .workflow()
        .publish(&PostDraft::text_only("x"), &proof)
        .await;

    assert!(matches!(result, Err(PublishError::NullifierAlreadyUsed)));
    let message = result.unwrap_err().to_string();
    assert!(message.contains("verify again"));
    assert_eq!(harness.contract.preflight_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.contract.simulate_calls.load(Ordering::SeqCst), 0);
    assert_eq!(harness.contract.publish_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn preflight_outage_is_advisory_and_publish_proceeds() {
    let harness = Harness {
        contract: MockContract::with_preflight(PreflightBehavior::Unavailable),
        ..Harness::new()
    };
    let outcome = harness
        .workflow()
        .publish(&PostDraft::text_only("x"), &proof_with_nullifier(3))
        .await
        .unwrap();

    assert_eq!(harness.contract.preflight_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.contract.publish_calls.load(Ordering::SeqCst), 1);
    assert!(!outcome.tx_hash.is_empty());
}

#[tokio::test]
async fn simulation_revert_never_submits() {
    let harness = Harness {
        contract: MockContract::with_simulate_failure("InvalidWorldIDProof"),
        ..Harness::new()
    };
    let result = harness
        .workflow()
        .publish(&PostDraft::text_only("x"), &proof_with_nullifier(1))
        .await;

    match result {
        Err(PublishError::Rejected(RevertReason::InvalidProof)) => {}
        other => panic!("expected proof-invalid rejection, got {other:?}"),
    }
    assert_eq!(harness.contract.simulate_calls.load(Ordering::SeqCst), 1);
    assert_eq!(harness.contract.publish_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ids_are_sequential_across_successful_publishes() {
    let harness = Harness::new();
    for nullifier in 1..=3u64 {
        harness
            .workflow()
            .publish(
                &PostDraft::text_only(format!("post {nullifier}")),
                &proof_with_nullifier(nullifier * 1000),
            )
            .await
            .unwrap();
    }

    let ids: Vec<u64> = harness
        .contract
        .published_posts()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn reused_nullifier_is_rejected_on_second_publish() {
    let harness = Harness::new();
    let workflow = harness.workflow();

    workflow
        .publish(&PostDraft::text_only("first"), &proof_with_nullifier(5))
        .await
        .unwrap();

    // Same nullifier again: the preflight catches it locally.
    let result = workflow
        .publish(&PostDraft::text_only("second"), &proof_with_nullifier(5))
        .await;
    assert!(matches!(result, Err(PublishError::NullifierAlreadyUsed)));
    assert_eq!(harness.contract.published_posts().len(), 1);
}
