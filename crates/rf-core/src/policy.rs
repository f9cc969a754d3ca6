//! Authorization policies for mutating actions.
//!
//! Policies are plain objects handed to `ForumService`; there is no global
//! gate registry.

use crate::models::{Comment, Post, UserId};

/// Anything with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> UserId;
}

impl Owned for Post {
    fn owner_id(&self) -> UserId {
        self.author.id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> UserId {
        self.author.id
    }
}

/// Decides whether `actor` may delete `entity`.
pub trait DeletePolicy<T>: Send + Sync {
    /// Name used in logs, e.g. `post-delete`.
    fn action(&self) -> &'static str;

    fn can_delete(&self, actor: UserId, entity: &T) -> bool;
}

/// Only the author may delete.
#[derive(Debug, Clone, Copy)]
pub struct AuthorOnly {
    action: &'static str,
}

impl AuthorOnly {
    pub const POST_DELETE: AuthorOnly = AuthorOnly { action: "post-delete" };
    pub const COMMENT_DELETE: AuthorOnly = AuthorOnly { action: "comment-delete" };
}

impl<T: Owned> DeletePolicy<T> for AuthorOnly {
    fn action(&self) -> &'static str {
        self.action
    }

    fn can_delete(&self, actor: UserId, entity: &T) -> bool {
        entity.owner_id() == actor
    }
}
