//! Category and tag management.

use quill_common::{slugify, AppError, AppResult, IdGenerator};
use quill_db::entities::{category, tag};
use quill_db::repositories::{CategoryRepository, TagRepository};
use sea_orm::Set;

/// Taxonomy service for categories and tags.
#[derive(Clone)]
pub struct TaxonomyService {
    category_repo: CategoryRepository,
    tag_repo: TagRepository,
    id_gen: IdGenerator,
}

impl TaxonomyService {
    /// Create a new taxonomy service.
    #[must_use]
    pub fn new(category_repo: CategoryRepository, tag_repo: TagRepository) -> Self {
        Self {
            category_repo,
            tag_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List all categories.
    pub async fn list_categories(&self) -> AppResult<Vec<category::Model>> {
        self.category_repo.all().await
    }

    /// List all tags.
    pub async fn list_tags(&self) -> AppResult<Vec<tag::Model>> {
        self.tag_repo.all().await
    }

    /// Fetch a category by name, creating it on first use.
    pub async fn get_or_create_category(&self, name: &str) -> AppResult<category::Model> {
        let name = name.trim();
        if let Some(existing) = self.category_repo.find_by_name(name).await? {
            return Ok(existing);
        }

        let model = category::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
        };
        match self.category_repo.create(model).await {
            Ok(created) => Ok(created),
            // Lost a get-or-create race; the winner's row is there to fetch.
            Err(err) if is_unique_violation(&err) => {
                self.category_repo.find_by_name(name).await?.ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Fetch a tag by name, creating it on first use.
    pub async fn get_or_create_tag(&self, name: &str) -> AppResult<tag::Model> {
        let name = name.trim();
        if let Some(existing) = self.tag_repo.find_by_name(name).await? {
            return Ok(existing);
        }

        let model = tag::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name.to_string()),
            slug: Set(slugify(name)),
        };
        match self.tag_repo.create(model).await {
            Ok(created) => Ok(created),
            Err(err) if is_unique_violation(&err) => {
                self.tag_repo.find_by_name(name).await?.ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Resolve a list of tag names to models, creating missing ones.
    /// Duplicate and empty names are skipped.
    pub async fn resolve_tags(&self, names: &[String]) -> AppResult<Vec<tag::Model>> {
        let mut tags: Vec<tag::Model> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if tags.iter().any(|t| t.name.eq_ignore_ascii_case(name)) {
                continue;
            }
            tags.push(self.get_or_create_tag(name).await?);
        }
        Ok(tags)
    }
}

/// Whether a database error is a unique-index violation from a
/// concurrent insert of the same name.
fn is_unique_violation(err: &AppError) -> bool {
    matches!(
        err,
        AppError::Database(msg)
            if msg.contains("duplicate key") || msg.contains("unique constraint")
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn tech() -> category::Model {
        category::Model {
            id: "c1".to_string(),
            name: "Tech".to_string(),
            slug: "tech".to_string(),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_category_existing() {
        let category_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[tech()]])
                .into_connection(),
        );
        let tag_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = TaxonomyService::new(
            CategoryRepository::new(category_db),
            TagRepository::new(tag_db),
        );

        let result = service.get_or_create_category("Tech").await.unwrap();
        assert_eq!(result.id, "c1");
    }

    #[tokio::test]
    async fn test_get_or_create_category_creates_with_slug() {
        let created = category::Model {
            id: "c2".to_string(),
            name: "Rust Programming".to_string(),
            slug: "rust-programming".to_string(),
        };

        let category_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<category::Model>::new()])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[created]])
                .into_connection(),
        );
        let tag_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let service = TaxonomyService::new(
            CategoryRepository::new(category_db),
            TagRepository::new(tag_db),
        );

        let result = service
            .get_or_create_category("Rust Programming")
            .await
            .unwrap();
        assert_eq!(result.slug, "rust-programming");
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(is_unique_violation(&AppError::Database(
            "Execution Error: duplicate key value violates unique constraint \"idx-category-name\""
                .to_string()
        )));
        assert!(!is_unique_violation(&AppError::Database(
            "connection reset by peer".to_string()
        )));
        assert!(!is_unique_violation(&AppError::NotFound(
            "category".to_string()
        )));
    }

    #[tokio::test]
    async fn test_resolve_tags_skips_duplicates_and_blanks() {
        let rust = tag::Model {
            id: "t1".to_string(),
            name: "rust".to_string(),
            slug: "rust".to_string(),
        };

        let category_db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let tag_db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[rust]])
                .into_connection(),
        );

        let service = TaxonomyService::new(
            CategoryRepository::new(category_db),
            TagRepository::new(tag_db),
        );

        let names = vec![
            "rust".to_string(),
            "Rust".to_string(),
            String::new(),
            "  ".to_string(),
        ];
        let tags = service.resolve_tags(&names).await.unwrap();

        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "rust");
    }
}
