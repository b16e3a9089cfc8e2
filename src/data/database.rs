//! SQLite database operations
//!
//! All database access goes through this module.

use std::path::Path;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use super::models::*;
use crate::error::AppError;

const AUTH_TOKEN_HASH_PREFIX: &str = "sha256:";

fn hash_auth_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{}{}", AUTH_TOKEN_HASH_PREFIX, URL_SAFE_NO_PAD.encode(digest))
}

/// Map a unique-constraint failure on `accounts.email` to a validation error.
fn map_account_write_error(error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Validation("an account with this email already exists".to_string())
        }
        _ => AppError::Database(error),
    }
}

/// Escape LIKE wildcards so a search term matches literally under `ESCAPE '\'`
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Translate an optional page size into SQLite's LIMIT, where -1 means unbounded.
fn sql_limit(limit: Option<usize>) -> i64 {
    limit.map(|limit| limit as i64).unwrap_or(-1)
}

/// Database connection pool wrapper
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    /// Insert a new account
    ///
    /// # Errors
    /// `AppError::Validation` if the email is already registered
    pub async fn insert_account(&self, account: &Account) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, first_name, last_name, password_hash,
                is_staff, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.is_staff)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_account_write_error)?;

        Ok(())
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Get account by (normalized) email
    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    /// Check whether an email is registered to an account other than `exclude_id`
    pub async fn email_in_use(
        &self,
        email: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM accounts WHERE email = ? AND (? IS NULL OR id != ?)",
        )
        .bind(email)
        .bind(exclude_id)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    /// List accounts in registration order
    ///
    /// # Arguments
    /// * `search` - Case-insensitive substring matched against email and names
    /// * `limit` - Maximum number of results (`None` for all)
    /// * `offset` - Number of rows to skip
    pub async fn list_accounts(
        &self,
        search: Option<&str>,
        limit: Option<usize>,
        offset: usize,
    ) -> Result<Vec<Account>, AppError> {
        let pattern = search.map(|term| format!("%{}%", escape_like(&term.to_lowercase())));

        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT * FROM accounts
            WHERE ? IS NULL
                OR lower(email) LIKE ? ESCAPE '\'
                OR lower(first_name) LIKE ? ESCAPE '\'
                OR lower(COALESCE(last_name, '')) LIKE ? ESCAPE '\'
            ORDER BY rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(&pattern)
        .bind(sql_limit(limit))
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    /// Overwrite mutable account fields
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching account row exists.
    pub async fn update_account(&self, account: &Account) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET email = ?, first_name = ?, last_name = ?, password_hash = ?,
                is_staff = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.email)
        .bind(&account.first_name)
        .bind(&account.last_name)
        .bind(&account.password_hash)
        .bind(account.is_staff)
        .bind(account.is_active)
        .bind(account.updated_at)
        .bind(&account.id)
        .execute(&self.pool)
        .await
        .map_err(map_account_write_error)?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete account by ID
    ///
    /// Owned statuses and auth tokens are removed by foreign key cascade.
    ///
    /// # Returns
    /// `true` if a row was deleted
    pub async fn delete_account(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_accounts(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM accounts")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Statuses
    // =========================================================================

    /// Insert a new status
    pub async fn insert_status(&self, status: &StatusPost) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO statuses (id, owner_id, text, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&status.id)
        .bind(&status.owner_id)
        .bind(&status.text)
        .bind(status.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get status by ID
    pub async fn get_status(&self, id: &str) -> Result<Option<StatusPost>, AppError> {
        let status = sqlx::query_as::<_, StatusPost>("SELECT * FROM statuses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(status)
    }

    /// Stream statuses in insertion order
    ///
    /// Rows are fetched lazily as the stream is polled.
    pub fn stream_statuses(
        &self,
        filter: StatusFilter,
    ) -> BoxStream<'_, Result<StatusPost, AppError>> {
        sqlx::query_as::<_, StatusPost>(
            r#"
            SELECT * FROM statuses
            WHERE ? IS NULL OR owner_id = ?
            ORDER BY rowid ASC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(filter.owner_id.clone())
        .bind(filter.owner_id)
        .bind(sql_limit(filter.limit))
        .bind(filter.offset as i64)
        .fetch(&self.pool)
        .map_err(AppError::from)
        .boxed()
    }

    /// Replace status text
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching status exists.
    pub async fn update_status_text(&self, id: &str, text: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE statuses SET text = ? WHERE id = ?")
            .bind(text)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete status by ID
    pub async fn delete_status(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM statuses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count_statuses(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM statuses")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Auth tokens
    // =========================================================================

    /// Persist an issued token (stored as a digest)
    pub async fn insert_auth_token(
        &self,
        account_id: &str,
        token: &str,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthToken, AppError> {
        let auth_token = AuthToken {
            id: EntityId::new().0,
            account_id: account_id.to_string(),
            token_hash: hash_auth_token(token),
            created_at,
            expires_at,
            revoked: false,
        };

        sqlx::query(
            r#"
            INSERT INTO auth_tokens (id, account_id, token_hash, created_at, expires_at, revoked)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&auth_token.id)
        .bind(&auth_token.account_id)
        .bind(&auth_token.token_hash)
        .bind(auth_token.created_at)
        .bind(auth_token.expires_at)
        .bind(auth_token.revoked)
        .execute(&self.pool)
        .await?;

        Ok(auth_token)
    }

    /// Get a non-revoked token record by its plaintext value
    pub async fn get_auth_token(&self, token: &str) -> Result<Option<AuthToken>, AppError> {
        let auth_token = sqlx::query_as::<_, AuthToken>(
            "SELECT * FROM auth_tokens WHERE token_hash = ? AND revoked = 0",
        )
        .bind(hash_auth_token(token))
        .fetch_optional(&self.pool)
        .await?;

        Ok(auth_token)
    }

    /// Revoke a token by its plaintext value
    ///
    /// # Returns
    /// `true` if an active token was revoked
    pub async fn revoke_auth_token(&self, token: &str) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE auth_tokens SET revoked = 1 WHERE token_hash = ? AND revoked = 0")
                .bind(hash_auth_token(token))
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Remove tokens that expired before `now`
    pub async fn delete_expired_auth_tokens(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
