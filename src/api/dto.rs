//! Request and response DTOs
//!
//! Read views never carry credential material. Write payloads only
//! declare the fields a client may set; anything else is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::data::{Account, StatusPost};
use crate::error::AppError;
use crate::service::{AccountPatch, NewAccount};

/// Account read view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            is_staff: account.is_staff,
            is_active: account.is_active,
        }
    }
}

/// Status read view
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub id: String,
    pub owner_id: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl From<&StatusPost> for StatusResponse {
    fn from(status: &StatusPost) -> Self {
        Self {
            id: status.id.clone(),
            owner_id: status.owner_id.clone(),
            text: status.text.clone(),
            created_at: status.created_at,
        }
    }
}

fn required(field: &str, value: Option<String>) -> Result<String, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", field)))
}

/// Distinguish an absent field from an explicit `null`
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// POST /api/profiles
#[derive(Debug, Default, Deserialize)]
pub struct CreateAccountRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<CreateAccountRequest> for NewAccount {
    type Error = AppError;

    fn try_from(req: CreateAccountRequest) -> Result<Self, Self::Error> {
        Ok(NewAccount {
            email: required("email", req.email)?,
            first_name: required("first_name", req.first_name)?,
            last_name: req.last_name,
            password: required("password", req.password)?,
        })
    }
}

/// PUT /api/profiles/:id
///
/// Full replacement: `email` and `first_name` must be present and an
/// omitted `last_name` clears it. The password stays optional.
#[derive(Debug, Default, Deserialize)]
pub struct ReplaceAccountRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

impl TryFrom<ReplaceAccountRequest> for AccountPatch {
    type Error = AppError;

    fn try_from(req: ReplaceAccountRequest) -> Result<Self, Self::Error> {
        Ok(AccountPatch {
            email: Some(required("email", req.email)?),
            first_name: Some(required("first_name", req.first_name)?),
            last_name: Some(req.last_name),
            password: req.password,
        })
    }
}

/// PATCH /api/profiles/:id
#[derive(Debug, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub last_name: Option<Option<String>>,
    pub password: Option<String>,
}

impl From<UpdateAccountRequest> for AccountPatch {
    fn from(req: UpdateAccountRequest) -> Self {
        AccountPatch {
            email: req.email,
            first_name: req.first_name,
            last_name: req.last_name,
            password: req.password,
        }
    }
}

/// Status write payload
///
/// Only `text` is read; owner and timestamp are server-assigned.
#[derive(Debug, Default, Deserialize)]
pub struct StatusRequest {
    #[serde(alias = "status_text")]
    pub text: Option<String>,
}

impl StatusRequest {
    pub fn into_text(self) -> Result<String, AppError> {
        required("text", self.text)
    }
}

/// POST /api/login
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "username")]
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// GET /api/profiles query
#[derive(Debug, Default, Deserialize)]
pub struct AccountListParams {
    pub search: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// GET /api/feed query
#[derive(Debug, Default, Deserialize)]
pub struct StatusListParams {
    pub owner_id: Option<String>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}
