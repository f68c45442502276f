//! Notification fan-out and inbox management.

use crate::services::mailer::MailerService;
use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::notification::{self, NotificationKind};
use quill_db::entities::notification_preference;
use quill_db::repositories::{
    NotificationPreferenceRepository, NotificationRepository, UserRepository,
};
use sea_orm::Set;
use serde::Deserialize;

/// Default page size for notification listings.
const DEFAULT_LIMIT: u64 = 20;
const MAX_LIMIT: u64 = 100;

/// A notification about to be created.
#[derive(Debug, Clone)]
pub struct NotifyInput {
    /// Recipient user ID.
    pub user_id: String,
    /// User who triggered the notification.
    pub actor_id: Option<String>,
    /// Notification kind.
    pub kind: NotificationKind,
    /// Related post.
    pub post_id: Option<String>,
    /// Related comment.
    pub comment_id: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// Preference update request. Missing fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePreferencesInput {
    /// Notify on comments and replies.
    pub on_comment: Option<bool>,
    /// Notify on likes.
    pub on_like: Option<bool>,
    /// Also deliver by email.
    pub email_enabled: Option<bool>,
}

/// Notification service.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    preference_repo: NotificationPreferenceRepository,
    user_repo: UserRepository,
    mailer: MailerService,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub fn new(
        notification_repo: NotificationRepository,
        preference_repo: NotificationPreferenceRepository,
        user_repo: UserRepository,
        mailer: MailerService,
    ) -> Self {
        Self {
            notification_repo,
            preference_repo,
            user_repo,
            mailer,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a notification, honoring the recipient's preferences.
    ///
    /// Returns the created model, or `None` when the recipient has
    /// this kind disabled. Self-notifications are dropped.
    pub async fn notify(&self, input: NotifyInput) -> AppResult<Option<notification::Model>> {
        if input.actor_id.as_deref() == Some(input.user_id.as_str()) {
            return Ok(None);
        }

        let prefs = self.get_preferences(&input.user_id).await?;
        let enabled = match input.kind {
            NotificationKind::Comment | NotificationKind::Reply => prefs.on_comment,
            NotificationKind::Like => prefs.on_like,
        };
        if !enabled {
            return Ok(None);
        }

        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(input.user_id.clone()),
            actor_id: Set(input.actor_id),
            kind: Set(input.kind),
            post_id: Set(input.post_id),
            comment_id: Set(input.comment_id),
            message: Set(input.message.clone()),
            is_read: Set(false),
            created_at: Set(Utc::now().into()),
        };
        let created = self.notification_repo.create(model).await?;

        if prefs.email_enabled && self.mailer.is_enabled() {
            if let Ok(recipient) = self.user_repo.get_by_id(&input.user_id).await {
                if let Err(e) = self
                    .mailer
                    .send_notification(&recipient.email, &input.message)
                    .await
                {
                    tracing::warn!(error = %e, user_id = %input.user_id, "Failed to send notification email");
                }
            }
        }

        Ok(Some(created))
    }

    /// List a user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        limit: Option<u64>,
        until_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<notification::Model>> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        self.notification_repo
            .find_by_user(user_id, limit, until_id, unread_only)
            .await
    }

    /// Mark one of the user's notifications as read.
    pub async fn mark_read(&self, user_id: &str, notification_id: &str) -> AppResult<()> {
        let notification = self
            .notification_repo
            .find_by_id(notification_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "Notification belongs to another user".to_string(),
            ));
        }

        self.notification_repo.mark_as_read(notification_id).await
    }

    /// Mark all of the user's notifications as read.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }

    /// Count the user's unread notifications.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Get the user's preferences. A missing row means everything on.
    pub async fn get_preferences(
        &self,
        user_id: &str,
    ) -> AppResult<notification_preference::Model> {
        Ok(self
            .preference_repo
            .find_by_user(user_id)
            .await?
            .unwrap_or(notification_preference::Model {
                user_id: user_id.to_string(),
                on_comment: true,
                on_like: true,
                email_enabled: true,
                updated_at: None,
            }))
    }

    /// Update the user's preferences, creating the row on first write.
    pub async fn update_preferences(
        &self,
        user_id: &str,
        input: UpdatePreferencesInput,
    ) -> AppResult<notification_preference::Model> {
        let current = self.preference_repo.find_by_user(user_id).await?;
        let exists = current.is_some();
        let current = current.unwrap_or(notification_preference::Model {
            user_id: user_id.to_string(),
            on_comment: true,
            on_like: true,
            email_enabled: true,
            updated_at: None,
        });

        let model = notification_preference::ActiveModel {
            user_id: Set(user_id.to_string()),
            on_comment: Set(input.on_comment.unwrap_or(current.on_comment)),
            on_like: Set(input.on_like.unwrap_or(current.on_like)),
            email_enabled: Set(input.email_enabled.unwrap_or(current.email_enabled)),
            updated_at: Set(Some(Utc::now().into())),
        };

        if exists {
            self.preference_repo.update(model).await
        } else {
            self.preference_repo.create(model).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn empty_conn() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn notify_input(user_id: &str, actor_id: &str, kind: NotificationKind) -> NotifyInput {
        NotifyInput {
            user_id: user_id.to_string(),
            actor_id: Some(actor_id.to_string()),
            kind,
            post_id: Some("p1".to_string()),
            comment_id: None,
            message: "bob liked your post".to_string(),
        }
    }

    #[tokio::test]
    async fn test_self_notification_dropped() {
        let service = NotificationService::new(
            NotificationRepository::new(empty_conn()),
            NotificationPreferenceRepository::new(empty_conn()),
            UserRepository::new(empty_conn()),
            MailerService::disabled(),
        );

        let result = service
            .notify(notify_input("u1", "u1", NotificationKind::Like))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_notify_respects_like_preference() {
        let prefs = notification_preference::Model {
            user_id: "u1".to_string(),
            on_comment: true,
            on_like: false,
            email_enabled: true,
            updated_at: None,
        };

        let pref_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[prefs]])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(empty_conn()),
            NotificationPreferenceRepository::new(pref_db),
            UserRepository::new(empty_conn()),
            MailerService::disabled(),
        );

        let result = service
            .notify(notify_input("u1", "u2", NotificationKind::Like))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_mark_read_wrong_owner() {
        let other_users = notification::Model {
            id: "n1".to_string(),
            user_id: "u2".to_string(),
            actor_id: None,
            kind: NotificationKind::Comment,
            post_id: None,
            comment_id: None,
            message: "hi".to_string(),
            is_read: false,
            created_at: Utc::now().into(),
        };

        let notification_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[other_users]])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(notification_db),
            NotificationPreferenceRepository::new(empty_conn()),
            UserRepository::new(empty_conn()),
            MailerService::disabled(),
        );

        assert!(matches!(
            service.mark_read("u1", "n1").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_default_preferences_when_missing() {
        let pref_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification_preference::Model>::new()])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(empty_conn()),
            NotificationPreferenceRepository::new(pref_db),
            UserRepository::new(empty_conn()),
            MailerService::disabled(),
        );

        let prefs = service.get_preferences("u1").await.unwrap();
        assert!(prefs.on_comment);
        assert!(prefs.on_like);
        assert!(prefs.email_enabled);
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let notification_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let service = NotificationService::new(
            NotificationRepository::new(notification_db),
            NotificationPreferenceRepository::new(empty_conn()),
            UserRepository::new(empty_conn()),
            MailerService::disabled(),
        );

        assert_eq!(service.mark_all_read("u1").await.unwrap(), 2);
    }
}
