//! Feed endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use futures::TryStreamExt;

use super::dto::{StatusListParams, StatusRequest, StatusResponse};
use super::extract::{ApiJson, ApiQuery};
use crate::AppState;
use crate::auth::{Identity, MaybeUser};
use crate::data::StatusFilter;
use crate::error::AppError;
use crate::metrics::{POSTS_TOTAL, observe_request};

/// GET /api/feed
///
/// Anonymous callers may read the whole feed.
pub async fn list_statuses(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<StatusListParams>,
) -> Result<Json<Vec<StatusResponse>>, AppError> {
    let _timer = observe_request("GET", "/api/feed");

    let filter = StatusFilter {
        owner_id: params.owner_id.filter(|id| !id.is_empty()),
        limit: Some(state.config.page_size(params.limit)),
        offset: params.offset,
    };

    let service = state.status_service();
    let statuses: Vec<StatusResponse> = service
        .list_statuses(filter)
        .map_ok(|status| StatusResponse::from(&status))
        .try_collect()
        .await?;

    Ok(Json(statuses))
}

/// POST /api/feed
///
/// The new post is owned by the caller regardless of the payload.
pub async fn create_status(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<(StatusCode, Json<StatusResponse>), AppError> {
    let _timer = observe_request("POST", "/api/feed");

    let caller = caller.ok_or(AppError::Unauthorized)?;
    let text = req.into_text()?;
    let status = state
        .status_service()
        .create_status(Some(&caller), &text)
        .await?;
    POSTS_TOTAL.inc();

    Ok((StatusCode::CREATED, Json(StatusResponse::from(&status))))
}

/// GET /api/feed/:id
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, AppError> {
    let _timer = observe_request("GET", "/api/feed/:id");

    let status = state.status_service().get_status(&id).await?;
    Ok(Json(StatusResponse::from(&status)))
}

/// PUT /api/feed/:id
pub async fn replace_status(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let _timer = observe_request("PUT", "/api/feed/:id");
    apply_status_text(&state, caller, &id, req).await
}

/// PATCH /api/feed/:id
///
/// `text` is the only writable field, so this matches PUT.
pub async fn update_status(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let _timer = observe_request("PATCH", "/api/feed/:id");
    apply_status_text(&state, caller, &id, req).await
}

async fn apply_status_text(
    state: &AppState,
    caller: Option<Identity>,
    id: &str,
    req: StatusRequest,
) -> Result<Json<StatusResponse>, AppError> {
    let text = req.into_text()?;
    let status = state
        .status_service()
        .update_status(caller.as_ref(), id, &text)
        .await?;

    Ok(Json(StatusResponse::from(&status)))
}

/// DELETE /api/feed/:id
pub async fn delete_status(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let _timer = observe_request("DELETE", "/api/feed/:id");

    state
        .status_service()
        .delete_status(caller.as_ref(), &id)
        .await?;
    POSTS_TOTAL.dec();

    Ok(StatusCode::NO_CONTENT)
}
