//! # Domain Models
//!
//! These structs represent the core entities of Rusty-Forum.
//! Ids are the store's integer row ids.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type PostId = i64;
pub type CommentId = i64;

/// The public face of a user: what gets rendered next to their content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    pub name: String,
}

/// A top-level submission that comments and votes attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reply on a post, optionally nested under another comment of the same post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    /// `None` for a top-level comment
    pub parent_id: Option<CommentId>,
    pub author: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a post. Timestamps are stamped by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: UserId,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub author_id: UserId,
    pub post_id: PostId,
    pub parent_id: Option<CommentId>,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Discriminator of the polymorphic vote target, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotableType {
    Post,
    Comment,
}

impl VotableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VotableType::Post => "post",
            VotableType::Comment => "comment",
        }
    }
}

impl fmt::Display for VotableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VotableType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(VotableType::Post),
            "comment" => Ok(VotableType::Comment),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Something a user can vote on. Carries the id of the targeted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteTarget {
    Post(PostId),
    Comment(CommentId),
}

impl VoteTarget {
    pub fn new(kind: VotableType, id: i64) -> Self {
        match kind {
            VotableType::Post => VoteTarget::Post(id),
            VotableType::Comment => VoteTarget::Comment(id),
        }
    }

    pub fn kind(&self) -> VotableType {
        match self {
            VoteTarget::Post(_) => VotableType::Post,
            VoteTarget::Comment(_) => VotableType::Comment,
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            VoteTarget::Post(id) | VoteTarget::Comment(id) => id,
        }
    }
}

impl fmt::Display for VoteTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind(), self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteDirection {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(VoteDirection::Up),
            "down" => Ok(VoteDirection::Down),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Returned when a persisted or submitted enum value is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant `{0}`")]
pub struct UnknownVariant(pub String);

/// One user's standing vote on one target.
/// At most one exists per (voter, target).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    pub voter_id: UserId,
    pub target: VoteTarget,
    pub direction: VoteDirection,
}
