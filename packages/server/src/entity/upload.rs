use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Registry of upload references. Byte storage lives in an external
/// service; this table is what fundraising profiles point at and what the
/// reference validator checks.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "upload")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// ONE_PAGER or VIDEO.
    pub kind: String,

    pub filename: String,
    pub content_type: String,

    pub uploaded_by: i32,
    #[sea_orm(belongs_to, from = "uploaded_by", to = "id")]
    pub uploader: BelongsTo<super::user::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
