//! Password reset token repository.

use std::sync::Arc;

use crate::entities::{password_reset, PasswordReset};
use chrono::Utc;
use quill_common::{AppError, AppResult};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Password reset token repository for database operations.
#[derive(Clone)]
pub struct PasswordResetRepository {
    db: Arc<DatabaseConnection>,
}

impl PasswordResetRepository {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a new reset token row.
    pub async fn create(
        &self,
        model: password_reset::ActiveModel,
    ) -> AppResult<password_reset::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a live token for a user by its hash: unused and not expired.
    pub async fn find_valid(
        &self,
        user_id: &str,
        token_hash: &str,
    ) -> AppResult<Option<password_reset::Model>> {
        PasswordReset::find()
            .filter(password_reset::Column::UserId.eq(user_id))
            .filter(password_reset::Column::TokenHash.eq(token_hash))
            .filter(password_reset::Column::Used.eq(false))
            .filter(password_reset::Column::ExpiresAt.gt(Utc::now()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Burn a token after a successful reset.
    pub async fn mark_used(&self, id: &str) -> AppResult<()> {
        let model = password_reset::ActiveModel {
            id: Set(id.to_string()),
            used: Set(true),
            ..Default::default()
        };

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_find_valid_found() {
        let row = password_reset::Model {
            id: "r1".to_string(),
            user_id: "u1".to_string(),
            token_hash: "abc".to_string(),
            expires_at: (Utc::now() + Duration::hours(1)).into(),
            used: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[row]])
                .into_connection(),
        );

        let repo = PasswordResetRepository::new(db);
        let found = repo.find_valid("u1", "abc").await.unwrap();

        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_find_valid_none() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<password_reset::Model>::new()])
                .into_connection(),
        );

        let repo = PasswordResetRepository::new(db);
        assert!(repo.find_valid("u1", "abc").await.unwrap().is_none());
    }
}
