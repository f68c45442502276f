//! Post service: CRUD, taxonomy attachment, and the cached read path.
//!
//! Single posts and the unfiltered listing are cached; category- and
//! tag-filtered listings always go to the database. Every write
//! invalidates the two cache keys rather than refreshing them, and any
//! cache failure degrades to a database read.

use crate::cache::{post_key, post_list_key, CacheService};
use crate::services::guard::ensure_author;
use crate::services::taxonomy::TaxonomyService;
use chrono::Utc;
use quill_common::{AppResult, IdGenerator};
use quill_db::entities::{category, post, tag};
use quill_db::repositories::{CategoryRepository, PostFilter, PostRepository, TagRepository};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Post creation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePostInput {
    /// Post title.
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Post body.
    #[validate(length(min = 1))]
    pub content: String,
    /// Category name; created on first use.
    #[serde(default)]
    pub category: Option<String>,
    /// Tag names; created on first use.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Post update request. Missing fields are left unchanged; an empty
/// category string clears the category, and a tag list replaces the
/// post's tags wholesale.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    /// New title.
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    /// New body.
    #[validate(length(min = 1))]
    pub content: Option<String>,
    /// New category name, or "" to clear.
    pub category: Option<String>,
    /// Full replacement tag set.
    pub tags: Option<Vec<String>>,
}

/// A post with its category and tags resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetail {
    /// The post itself.
    #[serde(flatten)]
    pub post: post::Model,
    /// Category, if any.
    pub category: Option<category::Model>,
    /// Tags, ordered by name.
    pub tags: Vec<tag::Model>,
}

/// Post service.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    taxonomy: TaxonomyService,
    cache: CacheService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        category_repo: CategoryRepository,
        tag_repo: TagRepository,
        taxonomy: TaxonomyService,
        cache: CacheService,
    ) -> Self {
        Self {
            post_repo,
            category_repo,
            tag_repo,
            taxonomy,
            cache,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    pub async fn create(&self, author_id: &str, input: CreatePostInput) -> AppResult<PostDetail> {
        input.validate()?;

        let category = match input.category.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                Some(self.taxonomy.get_or_create_category(name).await?)
            }
            _ => None,
        };
        let tags = self.taxonomy.resolve_tags(&input.tags).await?;

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            content: Set(input.content),
            author_id: Set(author_id.to_string()),
            category_id: Set(category.as_ref().map(|c| c.id.clone())),
            likes_count: Set(0),
            views_count: Set(0),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let created = self.post_repo.create(model).await?;

        if !tags.is_empty() {
            let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
            self.post_repo.replace_tags(&created.id, &tag_ids).await?;
        }

        self.invalidate_list().await;
        tracing::info!(post_id = %created.id, author_id = %author_id, "Post created");

        Ok(PostDetail {
            post: created,
            category,
            tags,
        })
    }

    /// Fetch a post, serving from cache when possible.
    pub async fn get(&self, post_id: &str) -> AppResult<PostDetail> {
        let key = post_key(post_id);

        match self.cache.get(&key).await {
            Ok(Some(json)) => match serde_json::from_str::<PostDetail>(&json) {
                Ok(detail) => return Ok(detail),
                Err(e) => {
                    tracing::warn!(error = %e, post_id = %post_id, "Dropping undecodable cache entry");
                    if let Err(e) = self.cache.delete(&key).await {
                        tracing::warn!(error = %e, "Cache delete failed");
                    }
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Cache read failed, falling back to database"),
        }

        let detail = self.load_detail(post_id).await?;

        match serde_json::to_string(&detail) {
            Ok(json) => {
                if let Err(e) = self.cache.set(&key, &json).await {
                    tracing::warn!(error = %e, "Cache write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize post for cache"),
        }

        Ok(detail)
    }

    /// Record a view. The cached copy is left in place; view counts may
    /// lag by up to one TTL.
    pub async fn record_view(&self, post_id: &str) -> AppResult<()> {
        self.post_repo.increment_views_count(post_id).await
    }

    /// List posts, newest first. The unfiltered listing is cached;
    /// filtered listings always hit the database.
    pub async fn list(&self, filter: &PostFilter) -> AppResult<Vec<post::Model>> {
        if !filter.is_empty() {
            return self.post_repo.list(filter).await;
        }

        match self.cache.get(post_list_key()).await {
            Ok(Some(json)) => match serde_json::from_str::<Vec<post::Model>>(&json) {
                Ok(posts) => return Ok(posts),
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping undecodable cache entry");
                    if let Err(e) = self.cache.delete(post_list_key()).await {
                        tracing::warn!(error = %e, "Cache delete failed");
                    }
                }
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Cache read failed, falling back to database"),
        }

        let posts = self.post_repo.list(filter).await?;

        match serde_json::to_string(&posts) {
            Ok(json) => {
                if let Err(e) = self.cache.set(post_list_key(), &json).await {
                    tracing::warn!(error = %e, "Cache write failed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize listing for cache"),
        }

        Ok(posts)
    }

    /// Update a post. Author only.
    pub async fn update(
        &self,
        user_id: &str,
        post_id: &str,
        input: UpdatePostInput,
    ) -> AppResult<PostDetail> {
        input.validate()?;

        let existing = self.post_repo.get_by_id(post_id).await?;
        ensure_author(&existing.author_id, user_id)?;

        let mut model = post::ActiveModel {
            id: Set(existing.id.clone()),
            updated_at: Set(Some(Utc::now().into())),
            ..Default::default()
        };

        if let Some(title) = input.title {
            model.title = Set(title);
        }
        if let Some(content) = input.content {
            model.content = Set(content);
        }
        if let Some(category) = input.category {
            let name = category.trim();
            if name.is_empty() {
                model.category_id = Set(None);
            } else {
                let category = self.taxonomy.get_or_create_category(name).await?;
                model.category_id = Set(Some(category.id));
            }
        }

        let updated = self.post_repo.update(model).await?;

        if let Some(tag_names) = input.tags {
            let tags = self.taxonomy.resolve_tags(&tag_names).await?;
            let tag_ids: Vec<String> = tags.iter().map(|t| t.id.clone()).collect();
            self.post_repo.replace_tags(post_id, &tag_ids).await?;
        }

        self.invalidate_post(post_id).await;
        self.invalidate_list().await;
        tracing::info!(post_id = %post_id, "Post updated");

        self.assemble_detail(updated).await
    }

    /// Delete a post. Author only; comments and likes cascade.
    pub async fn delete(&self, user_id: &str, post_id: &str) -> AppResult<()> {
        let existing = self.post_repo.get_by_id(post_id).await?;
        ensure_author(&existing.author_id, user_id)?;

        self.post_repo.delete(post_id).await?;

        self.invalidate_post(post_id).await;
        self.invalidate_list().await;
        tracing::info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Drop a post's cache entry. Used by services that touch post
    /// counters, like the like service.
    pub async fn invalidate_post(&self, post_id: &str) {
        if let Err(e) = self.cache.delete(&post_key(post_id)).await {
            tracing::warn!(error = %e, post_id = %post_id, "Cache invalidation failed");
        }
    }

    /// Drop the cached unfiltered listing.
    pub async fn invalidate_list(&self) {
        if let Err(e) = self.cache.delete(post_list_key()).await {
            tracing::warn!(error = %e, "Cache invalidation failed");
        }
    }

    async fn load_detail(&self, post_id: &str) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(post_id).await?;
        self.assemble_detail(post).await
    }

    async fn assemble_detail(&self, post: post::Model) -> AppResult<PostDetail> {
        let category = match post.category_id.as_deref() {
            Some(category_id) => self.category_repo.find_by_id(category_id).await?,
            None => None,
        };
        let tags = self.tag_repo.find_by_post(&post.id).await?;

        Ok(PostDetail {
            post,
            category,
            tags,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCache, NoOpCache, PostCache};
    use quill_common::AppError;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn empty_conn() -> Arc<sea_orm::DatabaseConnection> {
        Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection())
    }

    fn create_test_post(id: &str, author_id: &str) -> post::Model {
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

    fn service_with(
        post_db: Arc<sea_orm::DatabaseConnection>,
        tag_db: Arc<sea_orm::DatabaseConnection>,
        cache: CacheService,
    ) -> PostService {
        let category_repo = CategoryRepository::new(empty_conn());
        PostService::new(
            PostRepository::new(post_db),
            category_repo.clone(),
            TagRepository::new(tag_db.clone()),
            TaxonomyService::new(category_repo, TagRepository::new(tag_db)),
            cache,
        )
    }

    #[tokio::test]
    async fn test_get_served_from_cache_without_db() {
        let detail = PostDetail {
            post: create_test_post("p1", "u1"),
            category: None,
            tags: vec![],
        };
        let cache: CacheService = Arc::new(MemoryCache::new(60));
        cache
            .set("post:p1", &serde_json::to_string(&detail).unwrap())
            .await
            .unwrap();

        // Empty mock connections: any database query would fail.
        let service = service_with(empty_conn(), empty_conn(), cache);

        let result = service.get("p1").await.unwrap();
        assert_eq!(result.post.id, "p1");
    }

    #[tokio::test]
    async fn test_get_miss_loads_and_caches() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1")]])
                .into_connection(),
        );
        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<tag::Model>::new()])
                .into_connection(),
        );
        let cache: CacheService = Arc::new(MemoryCache::new(60));

        let service = service_with(post_db, tag_db, cache.clone());
        let result = service.get("p1").await.unwrap();
        assert_eq!(result.post.id, "p1");

        // The detail is now cached.
        assert!(cache.get("post:p1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let service = service_with(post_db, empty_conn(), Arc::new(NoOpCache));

        assert!(matches!(
            service.get("missing").await,
            Err(AppError::PostNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_by_non_author_forbidden() {
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1")]])
                .into_connection(),
        );

        let service = service_with(post_db, empty_conn(), Arc::new(NoOpCache));

        let result = service
            .update("u2", "p1", UpdatePostInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_filtered_list_bypasses_cache() {
        let filter = PostFilter {
            category_slug: Some("tech".to_string()),
            tag_slug: None,
        };
        let post_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_post("p1", "u1")]])
                .into_connection(),
        );
        let cache: CacheService = Arc::new(MemoryCache::new(60));

        let service = service_with(post_db, empty_conn(), cache.clone());
        let posts = service.list(&filter).await.unwrap();
        assert_eq!(posts.len(), 1);

        // Filtered results are never written to the cache.
        assert!(cache.get("posts:all").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_invalid_title() {
        let service = service_with(empty_conn(), empty_conn(), Arc::new(NoOpCache));

        let input = CreatePostInput {
            title: String::new(),
            content: "body".to_string(),
            category: None,
            tags: vec![],
        };
        assert!(matches!(
            service.create("u1", input).await,
            Err(AppError::Validation(_))
        ));
    }
}
