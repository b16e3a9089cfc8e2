//! Login and logout endpoints
//!
//! Exchange an email/password pair for a bearer token and revoke it again.

use axum::{extract::State, http::HeaderMap, http::StatusCode, response::Json};

use super::dto::{LoginRequest, LoginResponse};
use super::extract::ApiJson;
use crate::AppState;
use crate::auth::{CurrentUser, extract_token_from_headers};
use crate::error::AppError;
use crate::metrics::{LOGINS_TOTAL, observe_request};

/// POST /api/login
///
/// Accepts `email` (or `username`) and `password`.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let _timer = observe_request("POST", "/api/login");

    let (Some(email), Some(password)) = (req.email, req.password) else {
        LOGINS_TOTAL.with_label_values(&["invalid"]).inc();
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    };

    match state.account_service().authenticate(&email, &password).await {
        Ok(token) => {
            LOGINS_TOTAL.with_label_values(&["success"]).inc();
            Ok(Json(LoginResponse { token }))
        }
        Err(e) => {
            LOGINS_TOTAL.with_label_values(&["failure"]).inc();
            Err(e)
        }
    }
}

/// POST /api/logout
///
/// Revokes the token presented with the request.
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let _timer = observe_request("POST", "/api/logout");

    let token = extract_token_from_headers(&headers).ok_or(AppError::Unauthorized)?;
    state.account_service().logout(&token).await?;

    tracing::info!(account_id = %user.account_id, "Logged out");
    Ok(StatusCode::NO_CONTENT)
}
