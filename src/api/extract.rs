//! Request extractors
//!
//! Thin wrappers over axum's `Json` and `Query` whose rejections are
//! reported as `AppError::Validation`, so malformed input gets the same
//! `{"error": ..}` body as every other failure.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string parameters
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
