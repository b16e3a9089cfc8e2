//! Profile endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use super::dto::{
    AccountListParams, AccountResponse, CreateAccountRequest, ReplaceAccountRequest,
    UpdateAccountRequest,
};
use super::extract::{ApiJson, ApiQuery};
use crate::AppState;
use crate::auth::MaybeUser;
use crate::error::AppError;
use crate::metrics::{USERS_TOTAL, observe_request};
use crate::service::{AccountPatch, NewAccount};

/// GET /api/profiles
pub async fn list_accounts(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<AccountListParams>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let _timer = observe_request("GET", "/api/profiles");

    let limit = state.config.page_size(params.limit);
    let accounts = state
        .account_service()
        .list_accounts(params.search.as_deref(), limit, params.offset)
        .await?;

    Ok(Json(accounts.iter().map(AccountResponse::from).collect()))
}

/// POST /api/profiles
///
/// Registration is open to anonymous callers.
pub async fn create_account(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let _timer = observe_request("POST", "/api/profiles");

    let input = NewAccount::try_from(req)?;
    let account = state.account_service().create_account(input).await?;
    USERS_TOTAL.inc();

    Ok((StatusCode::CREATED, Json(AccountResponse::from(&account))))
}

/// GET /api/profiles/:id
pub async fn get_account(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AccountResponse>, AppError> {
    let _timer = observe_request("GET", "/api/profiles/:id");

    let account = state.account_service().get_account(&id).await?;
    Ok(Json(AccountResponse::from(&account)))
}

/// PUT /api/profiles/:id
pub async fn replace_account(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ReplaceAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let _timer = observe_request("PUT", "/api/profiles/:id");

    let patch = AccountPatch::try_from(req)?;
    let account = state
        .account_service()
        .update_account(caller.as_ref(), &id, patch)
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}

/// PATCH /api/profiles/:id
pub async fn update_account(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let _timer = observe_request("PATCH", "/api/profiles/:id");

    let account = state
        .account_service()
        .update_account(caller.as_ref(), &id, req.into())
        .await?;

    Ok(Json(AccountResponse::from(&account)))
}
