//! ProfileFeed - a small account and status-feed backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - Profile / login endpoints                                │
//! │  - Status feed endpoints                                    │
//! │  - Admin and metrics endpoints                              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Account and status business rules                        │
//! │  - Access policy checks                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Hashed bearer tokens                                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database layer
//! - `auth`: Passwords, tokens, access policy and extractors
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod metrics;
pub mod service;

use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Bearer token store
    pub credentials: Arc<auth::CredentialStore>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database (migrations run here)
    /// 2. Build the credential store
    /// 3. Ensure the bootstrap staff account
    /// 4. Seed gauges and drop expired tokens
    ///
    /// # Errors
    /// Returns error if any initialization step fails
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        // 1. Connect to SQLite database
        let db = Arc::new(data::Database::connect(&config.database.path).await?);
        tracing::info!(path = %config.database.path.display(), "Database connected");

        // 2. Credential store
        let credentials = Arc::new(auth::CredentialStore::new(
            db.clone(),
            config.auth.token_max_age,
        ));

        let state = Self {
            config: Arc::new(config),
            db,
            credentials,
        };

        // 3. Initialize admin user
        state.ensure_admin_account().await?;

        // 4. Gauges and token housekeeping
        metrics::USERS_TOTAL.set(state.db.count_accounts().await?);
        metrics::POSTS_TOTAL.set(state.db.count_statuses().await?);
        let purged = state.credentials.purge_expired().await?;
        if purged > 0 {
            tracing::info!(purged, "Expired tokens removed");
        }

        tracing::info!("Application state initialized successfully");
        Ok(state)
    }

    pub fn account_service(&self) -> service::AccountService {
        service::AccountService::new(self.db.clone(), self.credentials.clone())
    }

    pub fn status_service(&self) -> service::StatusService {
        service::StatusService::new(self.db.clone())
    }

    /// Ensure the configured staff account exists
    ///
    /// Does nothing unless both `admin.email` and `admin.password` are set.
    /// An existing account with that email is left untouched.
    async fn ensure_admin_account(&self) -> Result<(), error::AppError> {
        let admin = &self.config.admin;
        let (Some(email), Some(password)) = (&admin.email, &admin.password) else {
            tracing::debug!("No admin account configured");
            return Ok(());
        };

        let lookup = email.trim().to_lowercase();
        if let Some(account) = self.db.get_account_by_email(&lookup).await? {
            tracing::info!(account_id = %account.id, "Admin account exists");
            return Ok(());
        }

        tracing::info!("Creating admin account...");
        let account = self
            .account_service()
            .create_privileged_account(service::NewAccount {
                email: email.clone(),
                first_name: admin.first_name.clone(),
                last_name: admin.last_name.clone(),
                password: password.clone(),
            })
            .await?;

        tracing::info!(account_id = %account.id, email = %account.email, "Admin account created");
        Ok(())
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
        trace::TraceLayer,
    };

    let max_body_bytes = state.config.limits.max_body_bytes;

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/api", api::api_router())
        .nest("/admin", api::admin_router())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(api::metrics_router())
}

async fn health_check() -> &'static str {
    "OK"
}
