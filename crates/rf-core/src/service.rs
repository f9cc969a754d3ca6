//! # ForumService
//!
//! Orchestrates the ports for the HTTP layer: existence checks, ownership
//! policies, and the vote and comment-tree machinery.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::comments::CommentTreeAssembler;
use crate::error::{AppError, FieldErrors, Result};
use crate::models::{
    Comment, CommentId, NewComment, NewPost, Post, PostId, UserId, VoteDirection, VoteTarget,
};
use crate::policy::{AuthorOnly, DeletePolicy};
use crate::presenter::{CommentView, PostPresenter, PostView};
use crate::traits::{CommentRepo, PostRepo, VoteStore};
use crate::votes::{VoteAggregator, VoteMutator, VoteOutcome};

pub const DEFAULT_PER_PAGE: u32 = 10;

/// Validated input for a new post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
}

/// Validated input for a new comment. Existence of the post and parent is
/// checked by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentDraft {
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
}

/// Result of a cast: what happened and the target's balance afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteReceipt {
    pub target: VoteTarget,
    pub outcome: VoteOutcome,
    pub count_votes: i64,
}

pub struct ForumService {
    posts: Arc<dyn PostRepo>,
    comments: Arc<dyn CommentRepo>,
    aggregator: VoteAggregator,
    mutator: VoteMutator,
    tree: CommentTreeAssembler,
    post_policy: Arc<dyn DeletePolicy<Post>>,
    comment_policy: Arc<dyn DeletePolicy<Comment>>,
    per_page: u32,
}

impl ForumService {
    pub fn new(
        posts: Arc<dyn PostRepo>,
        comments: Arc<dyn CommentRepo>,
        votes: Arc<dyn VoteStore>,
    ) -> Self {
        let aggregator = VoteAggregator::new(votes.clone());
        Self {
            posts,
            tree: CommentTreeAssembler::new(comments.clone(), aggregator.clone()),
            comments,
            mutator: VoteMutator::new(votes),
            aggregator,
            post_policy: Arc::new(AuthorOnly::POST_DELETE),
            comment_policy: Arc::new(AuthorOnly::COMMENT_DELETE),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page.max(1);
        self
    }

    pub fn with_policies(
        mut self,
        post_policy: Arc<dyn DeletePolicy<Post>>,
        comment_policy: Arc<dyn DeletePolicy<Comment>>,
    ) -> Self {
        self.post_policy = post_policy;
        self.comment_policy = comment_policy;
        self
    }

    /// Page numbers start at 1; 0 is treated as 1.
    #[tracing::instrument(skip(self))]
    pub async fn list_posts(&self, page: u32) -> Result<Vec<PostView>> {
        let limit = i64::from(self.per_page);
        let offset = i64::from(page.max(1) - 1) * limit;

        let posts = self.posts.list_posts(limit, offset).await?;
        let mut views = Vec::with_capacity(posts.len());
        for post in posts {
            views.push(self.present(post).await?);
        }
        Ok(views)
    }

    #[tracing::instrument(skip(self))]
    pub async fn show_post(&self, id: PostId) -> Result<PostView> {
        let post = self.find_post(id).await?;
        self.present(post).await
    }

    #[tracing::instrument(skip(self, draft))]
    pub async fn create_post(&self, author: UserId, draft: PostDraft) -> Result<PostView> {
        let post = self
            .posts
            .create_post(NewPost {
                author_id: author,
                title: draft.title,
                content: draft.content,
                created_at: Utc::now(),
            })
            .await?;
        info!(post_id = post.id, "post created");
        Ok(PostPresenter::present(post, 0, Vec::new()))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_post(&self, actor: UserId, id: PostId) -> Result<()> {
        let post = self.find_post(id).await?;
        authorize(&*self.post_policy, actor, &post)?;
        self.posts.delete_post(id).await?;
        info!("post deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self, draft), fields(post_id = draft.post_id))]
    pub async fn create_comment(&self, author: UserId, draft: CommentDraft) -> Result<CommentView> {
        if self.posts.get_post(draft.post_id).await?.is_none() {
            return Err(AppError::Validation(FieldErrors::single(
                "post_id",
                "The selected post id is invalid.",
            )));
        }
        if let Some(parent_id) = draft.parent_id {
            match self.comments.get_comment(parent_id).await? {
                None => {
                    return Err(AppError::Validation(FieldErrors::single(
                        "parent_id",
                        "The selected parent id is invalid.",
                    )))
                }
                Some(parent) if parent.post_id != draft.post_id => {
                    return Err(AppError::Validation(FieldErrors::single(
                        "parent_id",
                        "The parent comment must belong to the same post.",
                    )))
                }
                Some(_) => {}
            }
        }

        let comment = self
            .comments
            .create_comment(NewComment {
                author_id: author,
                post_id: draft.post_id,
                parent_id: draft.parent_id,
                content: draft.content,
                created_at: Utc::now(),
            })
            .await?;
        info!(comment_id = comment.id, "comment created");
        Ok(CommentView::bare(comment, 0))
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_comment(&self, actor: UserId, id: CommentId) -> Result<()> {
        let comment = self.comments.get_comment(id).await?.ok_or(AppError::NotFound(id))?;
        authorize(&*self.comment_policy, actor, &comment)?;
        self.comments.delete_comment(id).await?;
        info!("comment deleted");
        Ok(())
    }

    /// The decorated two-level tree of a post, without the post itself.
    #[tracing::instrument(skip(self))]
    pub async fn comment_tree(&self, post_id: PostId) -> Result<Vec<CommentView>> {
        self.find_post(post_id).await?;
        let tree = self.tree.assemble(post_id).await?;
        Ok(tree.into_iter().map(CommentView::from).collect())
    }

    #[tracing::instrument(skip(self, target), fields(target = %target))]
    pub async fn cast_vote(
        &self,
        voter: UserId,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> Result<VoteReceipt> {
        self.ensure_target_exists(target).await?;
        let outcome = self.mutator.cast(voter, target, direction).await?;
        let count_votes = self.aggregator.balance(target).await?;
        Ok(VoteReceipt { target, outcome, count_votes })
    }

    /// Resolves the polymorphic target to its backing table.
    async fn ensure_target_exists(&self, target: VoteTarget) -> Result<()> {
        let exists = match target {
            VoteTarget::Post(id) => self.posts.get_post(id).await?.is_some(),
            VoteTarget::Comment(id) => self.comments.get_comment(id).await?.is_some(),
        };
        if exists {
            Ok(())
        } else {
            Err(AppError::NotFound(target.id()))
        }
    }

    async fn find_post(&self, id: PostId) -> Result<Post> {
        self.posts.get_post(id).await?.ok_or(AppError::NotFound(id))
    }

    async fn present(&self, post: Post) -> Result<PostView> {
        let count_votes = self.aggregator.balance(VoteTarget::Post(post.id)).await?;
        let comments = self.tree.assemble(post.id).await?;
        Ok(PostPresenter::present(post, count_votes, comments))
    }
}

fn authorize<T>(policy: &dyn DeletePolicy<T>, actor: UserId, entity: &T) -> Result<()> {
    if policy.can_delete(actor, entity) {
        Ok(())
    } else {
        tracing::warn!(action = policy.action(), actor, "authorization denied");
        Err(AppError::Forbidden)
    }
}
