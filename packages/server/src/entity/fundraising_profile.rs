use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A team's pitch-materials container for one event. `status` is derived
/// from the materials by a pure rule and recomputed on every mutation,
/// never hand-set.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fundraising_profile")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub team_id: i32,
    #[sea_orm(primary_key)]
    pub event_id: i32,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: BelongsTo<super::team::Entity>,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: BelongsTo<super::event::Entity>,

    pub one_pager_upload_id: Option<Uuid>,
    pub video_upload_id: Option<Uuid>,

    pub description: String,

    /// DRAFT or PUBLISHED.
    pub status: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
