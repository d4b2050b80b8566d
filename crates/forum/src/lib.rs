//! Forum orchestration: the publish workflow and the feed.
//!
//! Everything here is written against the collaborator traits
//! (`ForumContract`, `StorageClient`, `ThresholdClient`, `WalletProvider`),
//! so each workflow transition is unit-testable with mock collaborators
//! and no network.

pub mod diagnostic;
pub mod draft;
pub mod feed;
pub mod workflow;

pub use diagnostic::run_identifier_diagnostic;
pub use draft::{ImageAttachment, PostDraft};
pub use feed::{Feed, FeedError, FeedRenderer};
pub use workflow::{PublishError, PublishOutcome, PublishWorkflow, RevertReason, WorkflowConfig};
