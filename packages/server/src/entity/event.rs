use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// URL-facing identifier, e.g. "demo-day-2026".
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    pub description: String,

    pub starts_at: DateTimeUtc,
    pub ends_at: DateTimeUtc,

    /// One of:
    /// UPCOMING, REGISTRATION_OPEN, EARLY_ACCESS, ACTIVE, COMPLETED, ARCHIVED
    pub status: String,

    /// Soft delete. NULL means live.
    pub deleted_at: Option<DateTimeUtc>,

    #[sea_orm(has_many)]
    pub participants: HasMany<super::participant::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
