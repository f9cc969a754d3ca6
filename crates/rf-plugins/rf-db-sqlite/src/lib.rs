//! # rf-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `rf-core` domain models. Schema lives in `migrations/` and is
//! applied on connect.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use rf_core::models::{
    Author, Comment, CommentId, NewComment, NewPost, Post, PostId, UserId, Vote, VoteDirection,
    VoteTarget,
};
use rf_core::traits::{CommentRepo, PostRepo, UserRepo, VoteStore};
use rf_core::votes::{VoteOutcome, VoteState};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const POST_SELECT: &str = "SELECT p.id, p.title, p.content, p.created_at, p.updated_at, \
     u.id AS author_id, u.name AS author_name \
     FROM posts p JOIN users u ON u.id = p.user_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.post_id, c.parent_id, c.content, c.created_at, \
     c.updated_at, u.id AS author_id, u.name AS author_name \
     FROM comments c JOIN users u ON u.id = c.user_id";

const SELECT_VOTE: &str =
    "SELECT vote FROM votes WHERE user_id = ? AND votable_type = ? AND votable_id = ?";

const UPSERT_VOTE: &str =
    "INSERT INTO votes (user_id, votable_type, votable_id, vote, created_at, updated_at) \
     VALUES (?, ?, ?, ?, ?, ?) \
     ON CONFLICT (user_id, votable_type, votable_id) \
     DO UPDATE SET vote = excluded.vote, updated_at = excluded.updated_at";

const DELETE_VOTE: &str =
    "DELETE FROM votes WHERE user_id = ? AND votable_type = ? AND votable_id = ?";

pub struct SqliteForumRepo {
    pool: SqlitePool,
}

impl SqliteForumRepo {
    /// Opens (creating if needed) the database and applies pending migrations.
    ///
    /// `:memory:` databases are pinned to a single connection that is never
    /// recycled, since every SQLite connection would otherwise see its own
    /// empty database.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url `{database_url}`"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(Option::<Duration>::None)
                .max_lifetime(Option::<Duration>::None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("failed to open SQLite database")?;
        MIGRATOR
            .run(&pool)
            .await
            .context("failed to apply migrations")?;

        tracing::info!(max_connections, "SQLite repository ready");
        Ok(Self { pool })
    }

    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Registers a user. Registration itself is not part of the public API;
    /// this backs the seed command and tests.
    pub async fn create_user(&self, name: &str, email: &str) -> anyhow::Result<Author> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO users (name, email, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create user <{email}>"))?
        .last_insert_rowid();

        Ok(Author { id, name: name.to_string() })
    }

    /// Stores the digest of an issued API token for `user_id`.
    pub async fn store_token_hash(&self, user_id: UserId, token_hash: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO api_tokens (user_id, token_hash, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(token_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn author_from_row(row: &SqliteRow) -> Result<Author, sqlx::Error> {
    Ok(Author {
        id: row.try_get("author_id")?,
        name: row.try_get("author_name")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: author_from_row(row)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        post_id: row.try_get("post_id")?,
        parent_id: row.try_get("parent_id")?,
        author: author_from_row(row)?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PostRepo for SqliteForumRepo {
    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<Post>> {
        let row = sqlx::query(&format!("{POST_SELECT} WHERE p.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(post_from_row).transpose()?)
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> anyhow::Result<Vec<Post>> {
        let rows = sqlx::query(&format!(
            "{POST_SELECT} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(post_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_post(&self, post: NewPost) -> anyhow::Result<Post> {
        let id = sqlx::query(
            "INSERT INTO posts (user_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(post.author_id)
        .bind(post.title)
        .bind(post.content)
        .bind(post.created_at)
        .bind(post.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_post(id)
            .await?
            .ok_or_else(|| anyhow!("post #{id} missing right after insert"))
    }

    async fn delete_post(&self, id: PostId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CommentRepo for SqliteForumRepo {
    async fn get_comment(&self, id: CommentId) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query(&format!("{COMMENT_SELECT} WHERE c.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(comment_from_row).transpose()?)
    }

    async fn top_level_comments(&self, post_id: PostId) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{COMMENT_SELECT} WHERE c.post_id = ? AND c.parent_id IS NULL \
             ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(comment_from_row).collect::<Result<_, _>>()?)
    }

    async fn children_of(&self, parent_id: CommentId) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query(&format!(
            "{COMMENT_SELECT} WHERE c.parent_id = ? ORDER BY c.created_at DESC, c.id DESC"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(comment_from_row).collect::<Result<_, _>>()?)
    }

    async fn create_comment(&self, comment: NewComment) -> anyhow::Result<Comment> {
        let id = sqlx::query(
            "INSERT INTO comments (post_id, parent_id, user_id, content, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(comment.author_id)
        .bind(comment.content)
        .bind(comment.created_at)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_comment(id)
            .await?
            .ok_or_else(|| anyhow!("comment #{id} missing right after insert"))
    }

    async fn delete_comment(&self, id: CommentId) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl VoteStore for SqliteForumRepo {
    async fn find_vote(&self, voter: UserId, target: VoteTarget) -> anyhow::Result<Option<Vote>> {
        let direction: Option<String> = sqlx::query_scalar(SELECT_VOTE)
            .bind(voter)
            .bind(target.kind().as_str())
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;

        Ok(parse_direction(direction, target)?
            .map(|direction| Vote { voter_id: voter, target, direction }))
    }

    async fn count_by_direction(
        &self,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM votes WHERE votable_type = ? AND votable_id = ? AND vote = ?",
        )
        .bind(target.kind().as_str())
        .bind(target.id())
        .bind(direction.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// A single statement, so concurrent upserts for one key can never leave
    /// two rows behind.
    async fn upsert(
        &self,
        voter: UserId,
        target: VoteTarget,
        direction: VoteDirection,
    ) -> anyhow::Result<()> {
        let now = Utc::now();
        sqlx::query(UPSERT_VOTE)
            .bind(voter)
            .bind(target.kind().as_str())
            .bind(target.id())
            .bind(direction.as_str())
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to upsert vote on {target}"))?;
        Ok(())
    }

    async fn delete(&self, voter: UserId, target: VoteTarget) -> anyhow::Result<bool> {
        let result = sqlx::query(DELETE_VOTE)
            .bind(voter)
            .bind(target.kind().as_str())
            .bind(target.id())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// `BEGIN IMMEDIATE` takes the write lock before the read, so a second
    /// cast on any key waits until the first one commits or rolls back.
    async fn apply_cast(
        &self,
        voter: UserId,
        target: VoteTarget,
        requested: VoteDirection,
    ) -> anyhow::Result<Option<VoteDirection>> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .context("failed to start vote transaction")?;

        let held: Option<String> = sqlx::query_scalar(SELECT_VOTE)
            .bind(voter)
            .bind(target.kind().as_str())
            .bind(target.id())
            .fetch_optional(&mut *tx)
            .await?;
        let prior = parse_direction(held, target)?;

        let (_, outcome) = VoteState::from(prior).apply(requested);
        match outcome {
            VoteOutcome::Removed => {
                sqlx::query(DELETE_VOTE)
                    .bind(voter)
                    .bind(target.kind().as_str())
                    .bind(target.id())
                    .execute(&mut *tx)
                    .await?;
            }
            VoteOutcome::Created | VoteOutcome::Flipped => {
                let now = Utc::now();
                sqlx::query(UPSERT_VOTE)
                    .bind(voter)
                    .bind(target.kind().as_str())
                    .bind(target.id())
                    .bind(requested.as_str())
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit()
            .await
            .with_context(|| format!("failed to commit vote on {target}"))?;
        Ok(prior)
    }
}

fn parse_direction(raw: Option<String>, target: VoteTarget) -> anyhow::Result<Option<VoteDirection>> {
    raw.map(|raw| {
        VoteDirection::from_str(&raw).with_context(|| format!("corrupt vote row for {target}"))
    })
    .transpose()
}

#[async_trait]
impl UserRepo for SqliteForumRepo {
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Author>> {
        let row = sqlx::query(
            "SELECT u.id AS author_id, u.name AS author_name \
             FROM api_tokens t JOIN users u ON u.id = t.user_id WHERE t.token_hash = ?",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(author_from_row).transpose()?)
    }
}
