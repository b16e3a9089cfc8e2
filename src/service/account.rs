//! Account service
//!
//! Registration, profile updates, login and administrative removal.
//! Credentials are always derived from the password, never copied.

use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::auth::password::{
    hash_password_blocking, validate_password, verify_password_blocking,
};
use crate::auth::{Action, CredentialStore, Identity, Policy};
use crate::data::{Account, Database, EntityId};
use crate::error::AppError;

pub const MAX_EMAIL_CHARS: usize = 254;
pub const MAX_NAME_CHARS: usize = 30;

/// Hash verified against when the email is unknown, so that both
/// login failures cost one Argon2 verification.
static DUMMY_PASSWORD_HASH: OnceCell<String> = OnceCell::const_new();

async fn dummy_password_hash() -> Result<String, AppError> {
    DUMMY_PASSWORD_HASH
        .get_or_try_init(|| hash_password_blocking("profilefeed-dummy-password".to_string()))
        .await
        .cloned()
}

/// Trim and lower-case an email, then check its shape
fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::Validation("email cannot be empty".to_string()));
    }
    if email.chars().count() > MAX_EMAIL_CHARS {
        return Err(AppError::Validation(format!(
            "email must be at most {} characters",
            MAX_EMAIL_CHARS
        )));
    }

    let valid_shape = email
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        })
        .unwrap_or(false);
    if !valid_shape {
        return Err(AppError::Validation(
            "enter a valid email address".to_string(),
        ));
    }

    Ok(email)
}

fn normalize_first_name(raw: &str) -> Result<String, AppError> {
    let first_name = raw.trim();
    if first_name.is_empty() {
        return Err(AppError::Validation(
            "first_name cannot be empty".to_string(),
        ));
    }
    check_name_length("first_name", first_name)?;
    Ok(first_name.to_string())
}

/// Blank last names are stored as absent
fn normalize_last_name(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(last_name) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    check_name_length("last_name", last_name)?;
    Ok(Some(last_name.to_string()))
}

fn check_name_length(field: &str, value: &str) -> Result<(), AppError> {
    if value.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_CHARS
        )));
    }
    Ok(())
}

/// Input for account creation
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub password: String,
}

/// Field changes for an account
///
/// `None` leaves a field unchanged. `last_name: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<Option<String>>,
    pub password: Option<String>,
}

/// Account service
pub struct AccountService {
    db: Arc<Database>,
    credentials: Arc<CredentialStore>,
}

impl AccountService {
    /// Create new account service
    pub fn new(db: Arc<Database>, credentials: Arc<CredentialStore>) -> Self {
        Self { db, credentials }
    }

    /// Register a regular account
    ///
    /// # Errors
    /// `AppError::Validation` for an empty/malformed/duplicate email,
    /// an empty first name, or an unusable password
    pub async fn create_account(&self, input: NewAccount) -> Result<Account, AppError> {
        self.insert_new_account(input, false).await
    }

    /// Register a staff account
    ///
    /// Uses the same credential derivation as `create_account`.
    pub async fn create_privileged_account(&self, input: NewAccount) -> Result<Account, AppError> {
        self.insert_new_account(input, true).await
    }

    async fn insert_new_account(
        &self,
        input: NewAccount,
        is_staff: bool,
    ) -> Result<Account, AppError> {
        let email = normalize_email(&input.email)?;
        let first_name = normalize_first_name(&input.first_name)?;
        let last_name = normalize_last_name(input.last_name.as_deref())?;
        validate_password(&input.password)?;

        // Fast-path guard before expensive hashing; the unique index still decides races.
        if self.db.email_in_use(&email, None).await? {
            return Err(AppError::Validation(
                "an account with this email already exists".to_string(),
            ));
        }

        let password_hash = hash_password_blocking(input.password).await?;
        let now = chrono::Utc::now();
        let account = Account {
            id: EntityId::new().0,
            email,
            first_name,
            last_name,
            password_hash,
            is_staff,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.db.insert_account(&account).await?;

        tracing::info!(
            account_id = %account.id,
            email = %account,
            name = %account.full_name(),
            is_staff,
            "Account created"
        );

        Ok(account)
    }

    /// Get account by ID
    pub async fn get_account(&self, id: &str) -> Result<Account, AppError> {
        self.db.get_account(id).await?.ok_or(AppError::NotFound)
    }

    /// List accounts, optionally filtered by a search term
    pub async fn list_accounts(
        &self,
        search: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Account>, AppError> {
        let search = search.map(str::trim).filter(|term| !term.is_empty());
        self.db.list_accounts(search, Some(limit), offset).await
    }

    /// Apply profile changes to an account
    ///
    /// A new password re-derives the credential; other fields overwrite directly.
    ///
    /// # Errors
    /// - `AppError::NotFound` if `id` is unknown
    /// - `AppError::Unauthorized` / `AppError::Forbidden` unless `caller` is the account
    /// - `AppError::Validation` for invalid field values
    pub async fn update_account(
        &self,
        caller: Option<&Identity>,
        id: &str,
        patch: AccountPatch,
    ) -> Result<Account, AppError> {
        let mut account = self.get_account(id).await?;
        Policy::UpdateOwnProfile.authorize(caller, Action::Modify { owner_id: &account.id })?;

        if let Some(email) = patch.email.as_deref() {
            let email = normalize_email(email)?;
            if email != account.email && self.db.email_in_use(&email, Some(&account.id)).await? {
                return Err(AppError::Validation(
                    "an account with this email already exists".to_string(),
                ));
            }
            account.email = email;
        }
        if let Some(first_name) = patch.first_name.as_deref() {
            account.first_name = normalize_first_name(first_name)?;
        }
        if let Some(last_name) = patch.last_name {
            account.last_name = normalize_last_name(last_name.as_deref())?;
        }

        let password_changed = patch.password.is_some();
        if let Some(password) = patch.password {
            validate_password(&password)?;
            account.password_hash = hash_password_blocking(password).await?;
        }

        account.updated_at = chrono::Utc::now();
        if !self.db.update_account(&account).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(account_id = %account.id, password_changed, "Account updated");
        Ok(account)
    }

    /// Remove an account (administrative path)
    ///
    /// Owned statuses and issued tokens are removed with it.
    ///
    /// # Errors
    /// - `AppError::Forbidden` unless the caller is staff
    /// - `AppError::NotFound` if `id` is unknown
    pub async fn delete_account(&self, caller: &Identity, id: &str) -> Result<(), AppError> {
        if !caller.is_staff {
            return Err(AppError::Forbidden);
        }
        if !self.db.delete_account(id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(account_id = %id, removed_by = %caller.account_id, "Account deleted");
        Ok(())
    }

    /// Verify a login and issue a bearer token
    ///
    /// Unknown email, wrong password and inactive account all yield the
    /// same `AppError::InvalidCredentials`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, AppError> {
        let account = match normalize_email(email) {
            Ok(email) => self.db.get_account_by_email(&email).await?,
            Err(_) => None,
        };

        let stored_hash = match &account {
            Some(account) => account.password_hash.clone(),
            None => dummy_password_hash().await?,
        };
        let password_matches =
            verify_password_blocking(password.to_string(), stored_hash).await?;

        let account = match account {
            Some(account) if password_matches && account.is_active => account,
            _ => {
                tracing::info!("Login rejected");
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = self.credentials.issue(&account.id).await?;
        tracing::info!(account_id = %account.id, "Login succeeded");
        Ok(token)
    }

    /// Invalidate a bearer token
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if !self.credentials.revoke(token).await? {
            return Err(AppError::Unauthorized);
        }
        Ok(())
    }
}
