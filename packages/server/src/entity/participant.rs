use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One identity's registration record for one event. Rows are never
/// physically deleted; removal sets `deleted_at`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "participant")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub event_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "event_id", to = "id")]
    pub event: BelongsTo<super::event::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: BelongsTo<super::user::Entity>,

    /// INVESTOR or FOUNDER.
    pub kind: String,

    /// One of: PENDING, INVITED, ENABLED, DISABLED.
    pub status: String,

    /// Team the founder presents with. NULL for investors, always.
    pub team_id: Option<i32>,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: BelongsTo<Option<super::team::Entity>>,

    pub is_admin: bool,
    pub early_access: bool,
    pub confidentiality_accepted: bool,

    /// NULL (never requested), REQUESTED, APPROVED or REJECTED.
    pub lead_request_status: Option<String>,

    pub status_changed_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
