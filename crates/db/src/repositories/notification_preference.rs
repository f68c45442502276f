//! Notification preference repository.

use std::sync::Arc;

use crate::entities::{notification_preference, NotificationPreference};
use quill_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};

/// Notification preference repository for database operations.
#[derive(Clone)]
pub struct NotificationPreferenceRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationPreferenceRepository {
    /// Create a new notification preference repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user's preference row. A missing row means every
    /// notification kind is enabled.
    pub async fn find_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Option<notification_preference::Model>> {
        NotificationPreference::find_by_id(user_id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a preference row.
    pub async fn create(
        &self,
        model: notification_preference::ActiveModel,
    ) -> AppResult<notification_preference::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a preference row.
    pub async fn update(
        &self,
        model: notification_preference::ActiveModel,
    ) -> AppResult<notification_preference::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
