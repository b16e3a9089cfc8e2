//! API layer
//!
//! HTTP handlers for:
//! - Profiles and login (`/api/profiles`, `/api/login`, `/api/logout`)
//! - Status feed (`/api/feed`)
//! - Admin API
//! - Metrics (Prometheus)

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

mod accounts;
mod admin;
mod dto;
mod extract;
mod login;
pub mod metrics;
mod statuses;

pub use dto::*;

pub use admin::admin_router;
pub use metrics::metrics_router;

/// Create the `/api` router
///
/// Reads are open to anonymous callers; writes resolve the caller from
/// the `Authorization` header and defer to the access policy.
pub fn api_router() -> Router<AppState> {
    Router::new()
        // Authentication
        .route("/login", post(login::login))
        .route("/logout", post(login::logout))
        // Profiles
        .route(
            "/profiles",
            get(accounts::list_accounts).post(accounts::create_account),
        )
        .route(
            "/profiles/:id",
            get(accounts::get_account)
                .put(accounts::replace_account)
                .patch(accounts::update_account),
        )
        // Feed
        .route(
            "/feed",
            get(statuses::list_statuses).post(statuses::create_status),
        )
        .route(
            "/feed/:id",
            get(statuses::get_status)
                .put(statuses::replace_status)
                .patch(statuses::update_status)
                .delete(statuses::delete_status),
        )
}
