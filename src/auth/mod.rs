//! Token authentication
//!
//! Handles:
//! - Password credential derivation
//! - Bearer token lifecycle (credential store)
//! - Access policy
//! - Request identity extraction

mod middleware;
pub mod password;
mod policy;
mod token;

pub use middleware::{CurrentUser, MaybeUser, extract_token_from_headers};
pub use policy::{Action, Identity, Policy};
pub use token::CredentialStore;
