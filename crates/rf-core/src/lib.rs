//! rusty-forum/crates/rf-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Forum:
//! vote bookkeeping, comment trees, and the ports plugins implement.

pub mod comments;
pub mod error;
pub mod models;
pub mod policy;
pub mod presenter;
pub mod service;
pub mod traits;
pub mod votes;

// Re-exporting for easier access in other crates
pub use comments::{CommentNode, CommentTreeAssembler};
pub use error::*;
pub use models::*;
pub use policy::{AuthorOnly, DeletePolicy, Owned};
pub use presenter::{CommentView, PostPresenter, PostView};
pub use service::{CommentDraft, ForumService, PostDraft, VoteReceipt};
pub use traits::*;
pub use votes::{VoteAggregator, VoteMutator, VoteOutcome, VoteState};
