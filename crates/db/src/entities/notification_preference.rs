//! Notification preference entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Per-user notification delivery flags. One row per user; a missing row
/// means everything is enabled.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification_preference")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    /// Notify on comments and replies.
    #[sea_orm(default_value = true)]
    pub on_comment: bool,

    /// Notify on likes.
    #[sea_orm(default_value = true)]
    pub on_like: bool,

    /// Also deliver notifications by email.
    #[sea_orm(default_value = true)]
    pub email_enabled: bool,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
