//! Admin API endpoints
//!
//! Account administration. All routes require an authenticated staff caller.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::delete,
};

use crate::AppState;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::metrics::{POSTS_TOTAL, USERS_TOTAL, observe_request};

/// Create admin router
///
/// Routes:
/// - DELETE /admin/profiles/:id - Remove an account and its posts
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/profiles/:id", delete(delete_account))
}

/// DELETE /admin/profiles/:id
async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let _timer = observe_request("DELETE", "/admin/profiles/:id");

    state.account_service().delete_account(&user, &id).await?;

    // Cascade removed an unknown number of posts
    USERS_TOTAL.dec();
    POSTS_TOTAL.set(state.db.count_statuses().await?);

    Ok(StatusCode::NO_CONTENT)
}
