//! Authentication extractors
//!
//! Resolve the acting identity from the `Authorization` header.
//! Both `Token <key>` and `Bearer <key>` schemes are accepted.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, request::Parts},
};

use super::policy::Identity;
use crate::AppState;
use crate::error::AppError;

/// Extract the raw token from request headers
pub fn extract_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Token ").or_else(|| h.strip_prefix("Bearer ")))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
}

async fn authenticate_parts(
    parts: &mut Parts,
    state: &AppState,
) -> Result<Option<Identity>, AppError> {
    if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
        return Ok(Some(identity));
    }

    let Some(token) = extract_token_from_headers(&parts.headers) else {
        return Ok(None);
    };

    let identity = state.credentials.resolve_identity(&token).await?;
    if let Some(identity) = &identity {
        parts.extensions.insert(identity.clone());
    }

    Ok(identity)
}

/// Extractor for current authenticated user
///
/// Rejects with 401 when no valid token is presented.
///
/// # Usage
/// ```ignore
/// async fn handler(CurrentUser(identity): CurrentUser) -> impl IntoResponse {
///     format!("Hello, {}", identity.email)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        authenticate_parts(parts, &state)
            .await?
            .map(CurrentUser)
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional current user extractor
///
/// Yields `None` for anonymous callers and for invalid tokens; the
/// access policy then decides whether anonymity is acceptable.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<Identity>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(MaybeUser(authenticate_parts(parts, &state).await?))
    }
}
