//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! Adapters report failures through `anyhow`; the core turns them into
//! `AppError::Storage`.

use async_trait::async_trait;

use crate::models::{
    Author, Comment, CommentId, NewComment, NewPost, Post, PostId, UserId, Vote, VoteDirection,
    VoteTarget,
};

/// Data persistence contract for posts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepo: Send + Sync {
    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>>;
    /// Newest first.
    async fn list_posts(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Post>>;
    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post>;
    /// Returns whether a row was removed.
    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool>;
}

/// Data persistence contract for comments.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CommentRepo: Send + Sync {
    async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>>;
    /// Comments of `post_id` without a parent, newest first.
    async fn top_level_comments(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>>;
    /// Direct children of `parent_id`, newest first.
    async fn children_of(&self, parent_id: CommentId) -> anyhow::Result<Vec<Comment>>;
    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Comment>;
    async fn delete_comment(&self, id: CommentId) -> anyhow::Result<bool>;
}

/// Persistent vote table. Every method is keyed by the composite
/// (voter, target type, target id) identity, which is unique.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn find_vote(&self, voter: UserId, target: VoteTarget) -> anyhow::Result<Option<Vote>>;
    async fn count_by_direction(
        &self,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> anyhow::Result<i64>;
    /// Inserts the vote or overwrites the direction of the existing one,
    /// atomically with respect to the uniqueness constraint.
    async fn upsert(
        &self,
        voter: UserId,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> anyhow::Result<()>;
    async fn delete(&self, voter: UserId, target: VoteTarget) -> anyhow::Result<bool>;
    /// Applies one cast as a single unit: reads the held direction, then
    /// removes the vote (same direction) or writes `requested` (otherwise).
    /// Casts on the same key are serialized. Returns the direction held
    /// before the cast.
    async fn apply_cast(
        &self,
        voter: UserId,
        target: VoteTarget,
        requested: VoteDirection,
    ) -> anyhow::Result<Option<VoteDirection>>;
}

/// Lookup side of the user table needed by identity providers.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Author>>;
}

/// Identity contract: turns a presented credential into a user id.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is unknown, not that the lookup failed.
    async fn identify(&self, bearer_token: &str) -> anyhow::Result<Option<UserId>>;
}
