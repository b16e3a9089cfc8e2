//! Access policy
//!
//! Per-request predicates deciding whether the acting identity may
//! create or modify a record. Both services consume the same
//! `Policy::authorize` entry point for every write; reads are unrestricted
//! and never consult the policy.

use crate::data::Account;
use crate::error::AppError;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
    pub email: String,
    pub is_staff: bool,
}

impl From<&Account> for Identity {
    fn from(account: &Account) -> Self {
        Self {
            account_id: account.id.clone(),
            email: account.email.clone(),
            is_staff: account.is_staff,
        }
    }
}

/// Requested write on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    Create,
    /// Update or delete of a record owned by `owner_id`
    Modify { owner_id: &'a str },
}

/// Named capability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Accounts: anyone may register; only the account itself may write.
    UpdateOwnProfile,
    /// Statuses: writes need an authenticated caller and modifications
    /// need the owner.
    UpdateOwnStatus,
}

impl Policy {
    /// Decide whether `caller` may perform `action`
    ///
    /// # Errors
    /// - `AppError::Unauthorized` when a write needs a caller and there is none
    /// - `AppError::Forbidden` when the caller does not own the record
    pub fn authorize(
        self,
        caller: Option<&Identity>,
        action: Action<'_>,
    ) -> Result<(), AppError> {
        match (self, action) {
            (Policy::UpdateOwnProfile, Action::Create) => Ok(()),
            (Policy::UpdateOwnStatus, Action::Create) => match caller {
                Some(_) => Ok(()),
                None => Err(AppError::Unauthorized),
            },
            (_, Action::Modify { owner_id }) => {
                let caller = caller.ok_or(AppError::Unauthorized)?;
                if caller.account_id == owner_id {
                    Ok(())
                } else {
                    tracing::debug!(
                        policy = ?self,
                        caller = %caller.account_id,
                        owner = %owner_id,
                        "Modification denied"
                    );
                    Err(AppError::Forbidden)
                }
            }
        }
    }
}
