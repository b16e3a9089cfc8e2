//! Data models
//!
//! Rust structs representing database entities.
//! All models use ULID for IDs and chrono for timestamps.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Account
// =============================================================================

/// A registered user identity
///
/// `email` is the login identifier and is stored lower-cased.
/// `password_hash` holds an Argon2 PHC string and never leaves the service layer.
#[derive(Clone, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// First and last name separated by a single space
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref() {
            Some(last_name) if !last_name.is_empty() => {
                format!("{} {}", self.first_name, last_name)
            }
            _ => self.first_name.clone(),
        }
    }

    pub fn short_name(&self) -> &str {
        &self.first_name
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.email)
    }
}

// Manual impl so credential material never reaches log output.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("password_hash", &"<redacted>")
            .field("is_staff", &self.is_staff)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

// =============================================================================
// Status
// =============================================================================

/// A short text post owned by exactly one account
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StatusPost {
    pub id: String,
    /// Owning account, always the authenticated author
    pub owner_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for StatusPost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Selection for status listing
#[derive(Debug, Clone, Default)]
pub struct StatusFilter {
    /// Only posts owned by this account
    pub owner_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

// =============================================================================
// Auth tokens
// =============================================================================

/// Issued bearer token
///
/// Only the SHA-256 digest of the token is persisted.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthToken {
    pub id: String,
    pub account_id: String,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl AuthToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}
