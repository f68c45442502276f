//! Comment service: nested comments and reply notifications.

use crate::services::guard::ensure_author;
use crate::services::notification::{NotificationService, NotifyInput};
use chrono::Utc;
use quill_common::{AppError, AppResult, IdGenerator};
use quill_db::entities::notification::NotificationKind;
use quill_db::entities::{comment, post};
use quill_db::repositories::{CommentRepository, PostRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Comment creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCommentInput {
    /// Comment body.
    #[validate(length(min = 1, max = 10_000))]
    pub content: String,
    /// Parent comment for replies. Must be on the same post.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// A comment with its replies nested beneath it.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    /// The comment itself.
    #[serde(flatten)]
    pub comment: comment::Model,
    /// Direct replies, oldest first.
    pub replies: Vec<CommentNode>,
}

/// Comment service.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(
        comment_repo: CommentRepository,
        post_repo: PostRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            comment_repo,
            post_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a comment or reply on a post.
    pub async fn create(
        &self,
        author_id: &str,
        author_username: &str,
        post_id: &str,
        input: CreateCommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;

        let post = self.post_repo.get_by_id(post_id).await?;

        let parent = match input.parent_id.as_deref() {
            Some(parent_id) => {
                let parent = self.comment_repo.get_by_id(parent_id).await?;
                if parent.post_id != post_id {
                    return Err(AppError::Validation(
                        "Parent comment belongs to a different post".to_string(),
                    ));
                }
                Some(parent)
            }
            None => None,
        };

        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            author_id: Set(author_id.to_string()),
            content: Set(input.content),
            parent_id: Set(input.parent_id),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let created = self.comment_repo.create(model).await?;
        tracing::info!(comment_id = %created.id, post_id = %post_id, "Comment created");

        // Failures only lose a notification.
        for notify in notification_targets(
            author_id,
            author_username,
            &post,
            parent.as_ref(),
            &created.id,
        ) {
            if let Err(e) = self.notifications.notify(notify).await {
                tracing::warn!(error = %e, "Failed to create comment notification");
            }
        }

        Ok(created)
    }

    /// All comments on a post as a tree, oldest first at every level.
    pub async fn list_for_post(&self, post_id: &str) -> AppResult<Vec<CommentNode>> {
        self.post_repo.get_by_id(post_id).await?;
        let comments = self.comment_repo.find_by_post(post_id).await?;
        Ok(build_tree(comments))
    }

    /// Edit a comment. Author only.
    pub async fn update(
        &self,
        user_id: &str,
        comment_id: &str,
        content: String,
    ) -> AppResult<comment::Model> {
        if content.is_empty() {
            return Err(AppError::Validation("Content must not be empty".to_string()));
        }

        let existing = self.comment_repo.get_by_id(comment_id).await?;
        ensure_author(&existing.author_id, user_id)?;

        let model = comment::ActiveModel {
            id: Set(comment_id.to_string()),
            content: Set(content),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };
        self.comment_repo.update(model).await
    }

    /// Delete a comment and its replies. Author only.
    pub async fn delete(&self, user_id: &str, comment_id: &str) -> AppResult<()> {
        let existing = self.comment_repo.get_by_id(comment_id).await?;
        ensure_author(&existing.author_id, user_id)?;

        self.comment_repo.delete(comment_id).await?;
        tracing::info!(comment_id = %comment_id, "Comment deleted");
        Ok(())
    }
}

/// Notification recipients for a new comment. The post's author hears
/// about every comment; a reply additionally notifies the parent
/// comment's author. Self-notifications are filtered downstream, and a
/// reply to the post author's own comment yields a single notification.
fn notification_targets(
    author_id: &str,
    author_username: &str,
    post: &post::Model,
    parent: Option<&comment::Model>,
    comment_id: &str,
) -> Vec<NotifyInput> {
    let mut targets = Vec::with_capacity(2);

    if let Some(parent) = parent {
        targets.push(NotifyInput {
            user_id: parent.author_id.clone(),
            actor_id: Some(author_id.to_string()),
            kind: NotificationKind::Reply,
            post_id: Some(post.id.clone()),
            comment_id: Some(comment_id.to_string()),
            message: format!("{author_username} replied to your comment"),
        });
        if parent.author_id == post.author_id {
            return targets;
        }
    }

    targets.push(NotifyInput {
        user_id: post.author_id.clone(),
        actor_id: Some(author_id.to_string()),
        kind: NotificationKind::Comment,
        post_id: Some(post.id.clone()),
        comment_id: Some(comment_id.to_string()),
        message: format!("{author_username} commented on your post \"{}\"", post.title),
    });

    targets
}

/// Arrange a flat, chronologically ordered comment list into a tree.
/// Orphaned replies (parent deleted mid-fetch) are dropped.
fn build_tree(comments: Vec<comment::Model>) -> Vec<CommentNode> {
    let ids: std::collections::HashSet<String> =
        comments.iter().map(|c| c.id.clone()).collect();

    let mut children: HashMap<Option<String>, Vec<comment::Model>> = HashMap::new();
    for comment in comments {
        let parent = match &comment.parent_id {
            Some(parent_id) if ids.contains(parent_id) => Some(parent_id.clone()),
            Some(_) => continue,
            None => None,
        };
        children.entry(parent).or_default().push(comment);
    }

    attach(&None, &mut children)
}

fn attach(
    parent: &Option<String>,
    children: &mut HashMap<Option<String>, Vec<comment::Model>>,
) -> Vec<CommentNode> {
    children
        .remove(parent)
        .unwrap_or_default()
        .into_iter()
        .map(|comment| {
            let id = Some(comment.id.clone());
            CommentNode {
                comment,
                replies: attach(&id, children),
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::mailer::MailerService;
    use quill_db::repositories::{
        NotificationPreferenceRepository, NotificationRepository, UserRepository,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn empty_conn() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn notifications() -> NotificationService {
        NotificationService::new(
            NotificationRepository::new(empty_conn()),
            NotificationPreferenceRepository::new(empty_conn()),
            UserRepository::new(empty_conn()),
            MailerService::disabled(),
        )
    }

    fn test_post(id: &str, author_id: &str) -> post::Model {
        post::Model {
            id: id.to_string(),
            title: "Hello".to_string(),
            content: "World".to_string(),
            author_id: author_id.to_string(),
            category_id: None,
            likes_count: 0,
            views_count: 0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_comment(id: &str, post_id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            post_id: post_id.to_string(),
            author_id: "u1".to_string(),
            content: format!("comment {id}"),
            parent_id: parent_id.map(ToString::to_string),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_build_tree_nests_replies() {
        let comments = vec![
            test_comment("c1", "p1", None),
            test_comment("c2", "p1", None),
            test_comment("c3", "p1", Some("c1")),
            test_comment("c4", "p1", Some("c3")),
        ];

        let tree = build_tree(comments);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].comment.id, "c1");
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].comment.id, "c3");
        assert_eq!(tree[0].replies[0].replies[0].comment.id, "c4");
        assert!(tree[1].replies.is_empty());
    }

    #[test]
    fn test_build_tree_drops_orphans() {
        let comments = vec![
            test_comment("c1", "p1", None),
            test_comment("c2", "p1", Some("gone")),
        ];

        let tree = build_tree(comments);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_top_level_comment_notifies_post_author() {
        let post = test_post("p1", "u-post");
        let targets = notification_targets("u-commenter", "alice", &post, None, "c1");

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].user_id, "u-post");
        assert!(matches!(targets[0].kind, NotificationKind::Comment));
    }

    #[test]
    fn test_reply_notifies_parent_and_post_authors() {
        let post = test_post("p1", "u-post");
        let mut parent = test_comment("c1", "p1", None);
        parent.author_id = "u-parent".to_string();

        let targets = notification_targets("u-replier", "alice", &post, Some(&parent), "c2");

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].user_id, "u-parent");
        assert!(matches!(targets[0].kind, NotificationKind::Reply));
        assert_eq!(targets[1].user_id, "u-post");
        assert!(matches!(targets[1].kind, NotificationKind::Comment));
    }

    #[test]
    fn test_reply_to_post_author_notifies_once() {
        let post = test_post("p1", "u-post");
        let mut parent = test_comment("c1", "p1", None);
        parent.author_id = "u-post".to_string();

        let targets = notification_targets("u-replier", "alice", &post, Some(&parent), "c2");

        assert_eq!(targets.len(), 1);
        assert!(matches!(targets[0].kind, NotificationKind::Reply));
    }

    #[tokio::test]
    async fn test_create_on_missing_post() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<quill_db::entities::post::Model>::new()])
                .into_connection(),
        );

        let service = CommentService::new(
            CommentRepository::new(empty_conn()),
            PostRepository::new(post_db),
            notifications(),
        );

        let input = CreateCommentInput {
            content: "hi".to_string(),
            parent_id: None,
        };
        assert!(matches!(
            service.create("u1", "alice", "missing", input).await,
            Err(AppError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_reply_cross_post_rejected() {
        let post = test_post("p1", "u2");
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post]])
                .into_connection(),
        );
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c9", "other-post", None)]])
                .into_connection(),
        );

        let service = CommentService::new(
            CommentRepository::new(comment_db),
            PostRepository::new(post_db),
            notifications(),
        );

        let input = CreateCommentInput {
            content: "hi".to_string(),
            parent_id: Some("c9".to_string()),
        };
        match service.create("u1", "alice", "p1", input).await {
            Err(AppError::Validation(msg)) => assert!(msg.contains("different post")),
            _ => panic!("Expected Validation error"),
        }
    }

    #[tokio::test]
    async fn test_delete_by_non_author_forbidden() {
        let comment_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_comment("c1", "p1", None)]])
                .into_connection(),
        );

        let service = CommentService::new(
            CommentRepository::new(comment_db),
            PostRepository::new(empty_conn()),
            notifications(),
        );

        assert!(matches!(
            service.delete("u2", "c1").await,
            Err(AppError::Forbidden(_))
        ));
    }
}
