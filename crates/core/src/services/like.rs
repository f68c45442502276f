//! Like service.

use crate::services::notification::{NotificationService, NotifyInput};
use crate::services::post::PostService;
use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::like;
use quill_db::entities::notification::NotificationKind;
use quill_db::repositories::{LikeRepository, PostRepository};
use sea_orm::Set;

/// Like service.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    post_repo: PostRepository,
    posts: PostService,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub fn new(
        like_repo: LikeRepository,
        post_repo: PostRepository,
        posts: PostService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            like_repo,
            post_repo,
            posts,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Like a post. Rejects duplicates.
    pub async fn like(
        &self,
        user_id: &str,
        username: &str,
        post_id: &str,
    ) -> AppResult<like::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;

        if self.like_repo.has_liked(user_id, post_id).await? {
            return Err(AppError::Conflict("Already liked this post".to_string()));
        }

        let model = like::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            post_id: Set(post_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        let created = self.like_repo.create(model).await?;

        self.post_repo.increment_likes_count(post_id).await?;
        self.posts.invalidate_post(post_id).await;
        self.posts.invalidate_list().await;

        let notify = NotifyInput {
            user_id: post.author_id.clone(),
            actor_id: Some(user_id.to_string()),
            kind: NotificationKind::Like,
            post_id: Some(post_id.to_string()),
            comment_id: None,
            message: format!("{username} liked your post \"{}\"", post.title),
        };
        if let Err(e) = self.notifications.notify(notify).await {
            tracing::warn!(error = %e, "Failed to create like notification");
        }

        Ok(created)
    }

    /// Remove a like from a post.
    pub async fn unlike(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let like = self
            .like_repo
            .find_by_user_and_post(user_id, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Like not found".to_string()))?;

        self.like_repo.delete(&like.id).await?;
        self.post_repo.decrement_likes_count(post_id).await?;
        self.posts.invalidate_post(post_id).await;
        self.posts.invalidate_list().await;

        Ok(())
    }

    /// Whether a user has liked a post.
    pub async fn has_liked(&self, user_id: &str, post_id: &str) -> AppResult<bool> {
        self.like_repo.has_liked(user_id, post_id).await
    }
}
