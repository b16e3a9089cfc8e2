//! Service layer
//!
//! Contains business logic separated from HTTP handlers.
//! Services validate input, consult the access policy and
//! read/write through the database layer.

mod account;
mod status;

pub use account::{AccountPatch, AccountService, MAX_EMAIL_CHARS, MAX_NAME_CHARS, NewAccount};
pub use status::{MAX_STATUS_CHARS, StatusService};
