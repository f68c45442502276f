//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250301_000001_create_user_table;
mod m20250301_000002_create_category_table;
mod m20250301_000003_create_tag_table;
mod m20250301_000004_create_post_table;
mod m20250301_000005_create_post_tag_table;
mod m20250301_000006_create_comment_table;
mod m20250301_000007_create_like_table;
mod m20250301_000008_create_notification_table;
mod m20250301_000009_create_notification_preference_table;
mod m20250301_000010_create_password_reset_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_user_table::Migration),
            Box::new(m20250301_000002_create_category_table::Migration),
            Box::new(m20250301_000003_create_tag_table::Migration),
            Box::new(m20250301_000004_create_post_table::Migration),
            Box::new(m20250301_000005_create_post_tag_table::Migration),
            Box::new(m20250301_000006_create_comment_table::Migration),
            Box::new(m20250301_000007_create_like_table::Migration),
            Box::new(m20250301_000008_create_notification_table::Migration),
            Box::new(m20250301_000009_create_notification_preference_table::Migration),
            Box::new(m20250301_000010_create_password_reset_table::Migration),
        ]
    }
}
