//! Status service
//!
//! Handles status post operations: create, list, update, delete.
//! New posts are always attributed to the authenticated caller.

use std::sync::Arc;

use futures::stream::BoxStream;

use crate::auth::{Action, Identity, Policy};
use crate::data::{Database, EntityId, StatusFilter, StatusPost};
use crate::error::AppError;

pub const MAX_STATUS_CHARS: usize = 255;

/// Trim status text and enforce the length bounds
fn normalize_status_text(raw: &str) -> Result<String, AppError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "status text cannot be empty".to_string(),
        ));
    }
    if text.chars().count() > MAX_STATUS_CHARS {
        return Err(AppError::Validation(format!(
            "status text must be at most {} characters",
            MAX_STATUS_CHARS
        )));
    }
    Ok(text.to_string())
}

/// Status service
pub struct StatusService {
    db: Arc<Database>,
}

impl StatusService {
    /// Create new status service
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new status owned by `caller`
    ///
    /// # Errors
    /// - `AppError::Unauthorized` for anonymous callers
    /// - `AppError::Validation` for empty or over-long text
    pub async fn create_status(
        &self,
        caller: Option<&Identity>,
        text: &str,
    ) -> Result<StatusPost, AppError> {
        Policy::UpdateOwnStatus.authorize(caller, Action::Create)?;
        let caller = caller.ok_or(AppError::Unauthorized)?;
        let text = normalize_status_text(text)?;

        let status = StatusPost {
            id: EntityId::new().0,
            owner_id: caller.account_id.clone(),
            text,
            created_at: chrono::Utc::now(),
        };
        self.db.insert_status(&status).await?;

        tracing::info!(status_id = %status.id, owner_id = %status.owner_id, "Status created");
        Ok(status)
    }

    /// Get status by ID
    pub async fn get_status(&self, id: &str) -> Result<StatusPost, AppError> {
        self.db.get_status(id).await?.ok_or(AppError::NotFound)
    }

    /// Lazily list statuses in creation order
    ///
    /// Readable by anyone, including anonymous callers.
    pub fn list_statuses(
        &self,
        filter: StatusFilter,
    ) -> BoxStream<'_, Result<StatusPost, AppError>> {
        self.db.stream_statuses(filter)
    }

    /// Replace the text of a status
    ///
    /// # Errors
    /// - `AppError::NotFound` if `id` is unknown
    /// - `AppError::Unauthorized` / `AppError::Forbidden` unless `caller` owns the post
    /// - `AppError::Validation` for invalid text
    pub async fn update_status(
        &self,
        caller: Option<&Identity>,
        id: &str,
        text: &str,
    ) -> Result<StatusPost, AppError> {
        let mut status = self.get_status(id).await?;
        Policy::UpdateOwnStatus.authorize(
            caller,
            Action::Modify {
                owner_id: &status.owner_id,
            },
        )?;
        let text = normalize_status_text(text)?;

        if !self.db.update_status_text(&status.id, &text).await? {
            return Err(AppError::NotFound);
        }
        status.text = text;

        tracing::info!(status_id = %status.id, "Status updated");
        Ok(status)
    }

    /// Delete a status
    ///
    /// # Errors
    /// - `AppError::NotFound` if `id` is unknown
    /// - `AppError::Unauthorized` / `AppError::Forbidden` unless `caller` owns the post
    pub async fn delete_status(&self, caller: Option<&Identity>, id: &str) -> Result<(), AppError> {
        let status = self.get_status(id).await?;
        Policy::UpdateOwnStatus.authorize(
            caller,
            Action::Modify {
                owner_id: &status.owner_id,
            },
        )?;

        if !self.db.delete_status(&status.id).await? {
            return Err(AppError::NotFound);
        }

        tracing::info!(status_id = %status.id, "Status deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Account;
    use chrono::Utc;
    use futures::TryStreamExt;
    use tempfile::TempDir;

    async fn create_test_db() -> (Arc<Database>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("service-status.db");
        let db = Database::connect(&db_path).await.unwrap();
        (Arc::new(db), temp_dir)
    }

    async fn seed_identity(db: &Database, email: &str) -> Identity {
        let account = Account {
            id: EntityId::new().0,
            email: email.to_string(),
            first_name: "Poster".to_string(),
            last_name: None,
            password_hash: "unused".to_string(),
            is_staff: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        db.insert_account(&account).await.unwrap();
        Identity::from(&account)
    }

    #[tokio::test]
    async fn create_persists_status_for_caller() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_identity(&db, "alice@example.com").await;
        let service = StatusService::new(db.clone());

        let status = service.create_status(Some(&alice), "  hi  ").await.unwrap();
        assert_eq!(status.text, "hi");
        assert_eq!(status.owner_id, alice.account_id);

        let listed: Vec<StatusPost> = service
            .list_statuses(StatusFilter::default())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(listed, vec![status]);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_identity(&db, "alice@example.com").await;
        let service = StatusService::new(db.clone());

        assert!(matches!(
            service.create_status(None, "hello").await,
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            service.create_status(Some(&alice), "   ").await,
            Err(AppError::Validation(_))
        ));

        let too_long = "x".repeat(MAX_STATUS_CHARS + 1);
        assert!(matches!(
            service.create_status(Some(&alice), &too_long).await,
            Err(AppError::Validation(_))
        ));

        let at_limit = "é".repeat(MAX_STATUS_CHARS);
        let status = service.create_status(Some(&alice), &at_limit).await.unwrap();
        assert_eq!(status.text.chars().count(), MAX_STATUS_CHARS);
        assert_eq!(db.count_statuses().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn only_owner_can_update() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_identity(&db, "alice@example.com").await;
        let bob = seed_identity(&db, "bob@example.com").await;
        let service = StatusService::new(db.clone());
        let status = service.create_status(Some(&alice), "original").await.unwrap();

        let denied = service
            .update_status(Some(&bob), &status.id, "x")
            .await
            .unwrap_err();
        assert!(matches!(denied, AppError::Forbidden));
        assert_eq!(service.get_status(&status.id).await.unwrap().text, "original");

        let anonymous = service
            .update_status(None, &status.id, "x")
            .await
            .unwrap_err();
        assert!(matches!(anonymous, AppError::Unauthorized));

        let updated = service
            .update_status(Some(&alice), &status.id, "edited")
            .await
            .unwrap();
        assert_eq!(updated.text, "edited");
        assert_eq!(updated.owner_id, alice.account_id);
        assert_eq!(updated.created_at, status.created_at);

        let missing = service
            .update_status(Some(&alice), "missing", "x")
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound));
    }

    #[tokio::test]
    async fn only_owner_can_delete() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_identity(&db, "alice@example.com").await;
        let bob = seed_identity(&db, "bob@example.com").await;
        let service = StatusService::new(db.clone());
        let status = service.create_status(Some(&alice), "keep me").await.unwrap();

        assert!(matches!(
            service.delete_status(Some(&bob), &status.id).await,
            Err(AppError::Forbidden)
        ));
        assert!(service.get_status(&status.id).await.is_ok());

        service.delete_status(Some(&alice), &status.id).await.unwrap();
        assert!(matches!(
            service.get_status(&status.id).await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            service.delete_status(Some(&alice), &status.id).await,
            Err(AppError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_owner() {
        let (db, _temp_dir) = create_test_db().await;
        let alice = seed_identity(&db, "alice@example.com").await;
        let bob = seed_identity(&db, "bob@example.com").await;
        let service = StatusService::new(db.clone());

        service.create_status(Some(&alice), "a1").await.unwrap();
        service.create_status(Some(&bob), "b1").await.unwrap();
        service.create_status(Some(&alice), "a2").await.unwrap();

        let bobs: Vec<StatusPost> = service
            .list_statuses(StatusFilter {
                owner_id: Some(bob.account_id.clone()),
                ..Default::default()
            })
            .try_collect()
            .await
            .unwrap();
        assert_eq!(bobs.len(), 1);
        assert_eq!(bobs[0].text, "b1");
    }
}
