//! # rf-auth-simple
//!
//! Opaque bearer-token implementation of `IdentityProvider`.
//! Tokens are random v4 UUIDs handed out once; only their SHA-256 digest is
//! ever persisted or compared.

use std::sync::Arc;

use async_trait::async_trait;
use rf_core::models::UserId;
use rf_core::traits::{IdentityProvider, UserRepo};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hex-encoded SHA-256 of a presented token, the form stored in `api_tokens`.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mints a fresh token. The caller shows it to the user and stores
/// `hash_token(&token)`.
pub fn issue_token() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct TokenIdentityProvider {
    users: Arc<dyn UserRepo>,
}

impl TokenIdentityProvider {
    pub fn new(users: Arc<dyn UserRepo>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentityProvider {
    async fn identify(&self, bearer_token: &str) -> anyhow::Result<Option<UserId>> {
        let token = bearer_token.trim();
        if token.is_empty() {
            return Ok(None);
        }

        let user = self.users.find_by_token_hash(&hash_token(token)).await?;
        if user.is_none() {
            tracing::debug!("unknown bearer token presented");
        }
        Ok(user.map(|author| author.id))
    }
}
