//! Aggregate statistics.

use quill_common::AppResult;
use quill_db::entities::post;
use quill_db::repositories::{CommentRepository, LikeRepository, PostRepository, UserRepository};
use serde::Serialize;

/// Number of posts in the most-viewed list.
const MOST_VIEWED_LIMIT: u64 = 5;

/// Site-wide totals.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOverview {
    /// Registered users.
    pub users: u64,
    /// Published posts.
    pub posts: u64,
    /// Comments across all posts.
    pub comments: u64,
    /// Likes across all posts.
    pub likes: u64,
    /// Most-viewed posts, descending.
    pub most_viewed: Vec<MostViewedPost>,
}

/// Entry in the most-viewed list.
#[derive(Debug, Clone, Serialize)]
pub struct MostViewedPost {
    /// Post ID.
    pub id: String,
    /// Post title.
    pub title: String,
    /// View count.
    pub views_count: i32,
}

impl From<post::Model> for MostViewedPost {
    fn from(post: post::Model) -> Self {
        Self {
            id: post.id,
            title: post.title,
            views_count: post.views_count,
        }
    }
}

/// Stats service.
#[derive(Clone)]
pub struct StatsService {
    user_repo: UserRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    like_repo: LikeRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            user_repo,
            post_repo,
            comment_repo,
            like_repo,
        }
    }

    /// Collect the overview counters and the most-viewed posts.
    pub async fn overview(&self) -> AppResult<StatsOverview> {
        let users = self.user_repo.count().await?;
        let posts = self.post_repo.count().await?;
        let comments = self.comment_repo.count().await?;
        let likes = self.like_repo.count().await?;
        let most_viewed = self
            .post_repo
            .find_most_viewed(MOST_VIEWED_LIMIT)
            .await?
            .into_iter()
            .map(MostViewedPost::from)
            .collect();

        Ok(StatsOverview {
            users,
            posts,
            comments,
            likes,
            most_viewed,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_most_viewed_conversion() {
        let popular = post::Model {
            id: "p1".to_string(),
            title: "Hot take".to_string(),
            content: "...".to_string(),
            author_id: "u1".to_string(),
            category_id: None,
            likes_count: 3,
            views_count: 42,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let entry = MostViewedPost::from(popular);
        assert_eq!(entry.views_count, 42);
        assert_eq!(entry.title, "Hot take");
    }

    #[tokio::test]
    async fn test_overview_counts() {
        // Each count() issues one query; find_most_viewed issues one more.
        let user_db = mock_with_count(1);
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row_map(2)]])
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );
        let comment_db = mock_with_count(3);
        let like_db = mock_with_count(4);

        let service = StatsService::new(
            UserRepository::new(user_db),
            PostRepository::new(post_db),
            CommentRepository::new(comment_db),
            LikeRepository::new(like_db),
        );

        let overview = service.overview().await.unwrap();
        assert_eq!(overview.users, 1);
        assert_eq!(overview.posts, 2);
        assert_eq!(overview.comments, 3);
        assert_eq!(overview.likes, 4);
        assert!(overview.most_viewed.is_empty());
    }

    fn count_row_map(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        let mut row = std::collections::BTreeMap::new();
        row.insert("num_items", sea_orm::Value::BigInt(Some(n)));
        row
    }

    fn mock_with_count(n: i64) -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![count_row_map(n)]])
                .into_connection(),
        )
    }
}
