//! Response shapes for posts and comments.
//!
//! Field names follow the public JSON API (camelCase); timestamps are RFC 3339.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::comments::CommentNode;
use crate::models::{Author, Comment, CommentId, Post, PostId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub count_votes: i64,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: CommentId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub count_votes: i64,
    pub author: Author,
    pub children: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CommentView {
    /// A comment rendered on its own, e.g. right after creation.
    pub fn bare(comment: Comment, count_votes: i64) -> Self {
        Self::from(CommentNode { comment, count_votes, children: Vec::new() })
    }
}

impl From<CommentNode> for CommentView {
    fn from(node: CommentNode) -> Self {
        let CommentNode { comment, count_votes, children } = node;
        Self {
            id: comment.id,
            post_id: comment.post_id,
            parent_id: comment.parent_id,
            content: comment.content,
            count_votes,
            author: comment.author,
            children: children.into_iter().map(CommentView::from).collect(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}

/// Pure composition of a post, its balance and its comment tree.
pub struct PostPresenter;

impl PostPresenter {
    pub fn present(post: Post, count_votes: i64, comments: Vec<CommentNode>) -> PostView {
        PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            author: post.author,
            count_votes,
            comments: comments.into_iter().map(CommentView::from).collect(),
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}
