use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub email: String,
    pub name: String,

    /// NULL until the person sets credentials (bulk-imported and invited
    /// users exist before they ever log in).
    pub password_hash: Option<String>,

    /// One of: GUEST, APPLICANT, MEMBER, STAFF (ordered).
    pub access_tier: String,

    /// Platform role driving API permissions (see `role_permission`).
    pub role: String,
    #[sea_orm(belongs_to, from = "role", to = "name")]
    pub role_ref: BelongsTo<super::role::Entity>,

    pub telegram: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,

    #[sea_orm(has_many)]
    pub participations: HasMany<super::participant::Entity>,

    #[sea_orm(has_many)]
    pub memberships: HasMany<super::team_member::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
