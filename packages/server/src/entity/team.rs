use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Investment funds are teams too; this flag routes the investor
    /// profile to the team instead of the individual.
    pub is_fund: bool,

    #[sea_orm(has_many)]
    pub members: HasMany<super::team_member::Entity>,

    #[sea_orm(has_many)]
    pub fundraising_profiles: HasMany<super::fundraising_profile::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
