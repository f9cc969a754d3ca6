//! # Comment Trees
//!
//! Builds the two-level comment tree of a post: top-level comments and their
//! direct children, newest first at both levels, each node carrying its
//! vote balance. Deeper replies are stored but never fetched here.

use std::cmp::Reverse;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{Comment, PostId, VoteTarget};
use crate::traits::CommentRepo;
use crate::votes::VoteAggregator;

/// A comment decorated with its balance and (for top-level nodes) its replies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub count_votes: i64,
    /// Always empty on child nodes.
    pub children: Vec<CommentNode>,
}

#[derive(Clone)]
pub struct CommentTreeAssembler {
    comments: Arc<dyn CommentRepo>,
    votes: VoteAggregator,
}

impl CommentTreeAssembler {
    pub fn new(comments: Arc<dyn CommentRepo>, votes: VoteAggregator) -> Self {
        Self { comments, votes }
    }

    #[tracing::instrument(skip(self))]
    pub async fn assemble(&self, post_id: PostId) -> Result<Vec<CommentNode>> {
        let mut top_level = self.comments.top_level_comments(post_id).await?;
        newest_first(&mut top_level);

        let mut tree = Vec::with_capacity(top_level.len());
        for comment in top_level {
            let mut replies = self.comments.children_of(comment.id).await?;
            newest_first(&mut replies);

            let mut children = Vec::with_capacity(replies.len());
            for reply in replies {
                children.push(self.leaf(reply).await?);
            }

            let mut node = self.leaf(comment).await?;
            node.children = children;
            tree.push(node);
        }

        tracing::debug!(top_level = tree.len(), "comment tree assembled");
        Ok(tree)
    }

    async fn leaf(&self, comment: Comment) -> Result<CommentNode> {
        let count_votes = self.votes.balance(VoteTarget::Comment(comment.id)).await?;
        Ok(CommentNode { comment, count_votes, children: Vec::new() })
    }
}

/// Creation time descending; the later insert wins a tie.
fn newest_first(comments: &mut [Comment]) {
    comments.sort_by_key(|c| Reverse((c.created_at, c.id)));
}
