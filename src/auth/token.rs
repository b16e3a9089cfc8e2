//! Credential store
//!
//! Opaque bearer tokens with an explicit lifecycle:
//! issued at login, resolved per request, invalidated at logout or expiry.
//! Tokens are random; only their SHA-256 digest is persisted.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{Duration, Utc};
use rand::RngCore;

use super::policy::Identity;
use crate::data::Database;
use crate::error::AppError;

const TOKEN_BYTES: usize = 32;

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Issues, resolves and revokes bearer tokens
pub struct CredentialStore {
    db: Arc<Database>,
    max_age: Duration,
}

impl CredentialStore {
    /// Create a store whose tokens live for `max_age_seconds`
    pub fn new(db: Arc<Database>, max_age_seconds: i64) -> Self {
        Self {
            db,
            max_age: Duration::seconds(max_age_seconds),
        }
    }

    /// Issue a new token for an account
    ///
    /// The plaintext token is returned once and never stored.
    pub async fn issue(&self, account_id: &str) -> Result<String, AppError> {
        let token = generate_token();
        let now = Utc::now();
        self.db
            .insert_auth_token(account_id, &token, now, now + self.max_age)
            .await?;

        tracing::debug!(account_id, "Auth token issued");
        Ok(token)
    }

    /// Resolve a token to the owning account ID
    ///
    /// Returns `None` for unknown, revoked or expired tokens, and for
    /// tokens whose account has been deactivated.
    pub async fn resolve(&self, token: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .resolve_identity(token)
            .await?
            .map(|identity| identity.account_id))
    }

    /// Resolve a token to the acting identity
    pub async fn resolve_identity(&self, token: &str) -> Result<Option<Identity>, AppError> {
        let Some(auth_token) = self.db.get_auth_token(token).await? else {
            return Ok(None);
        };
        if auth_token.is_expired() {
            return Ok(None);
        }

        let account = self.db.get_account(&auth_token.account_id).await?;
        Ok(account
            .filter(|account| account.is_active)
            .map(|account| Identity::from(&account)))
    }

    /// Invalidate a token
    ///
    /// # Returns
    /// `true` if the token was active
    pub async fn revoke(&self, token: &str) -> Result<bool, AppError> {
        self.db.revoke_auth_token(token).await
    }

    /// Drop expired token rows
    pub async fn purge_expired(&self) -> Result<u64, AppError> {
        self.db.delete_expired_auth_tokens(Utc::now()).await
    }
}
