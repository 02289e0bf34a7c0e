use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_person_name;
use crate::error::AppError;

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    pub is_fund: Option<bool>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub name: String,
    pub is_fund: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::team::Model> for TeamResponse {
    fn from(m: crate::entity::team::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            is_fund: m.is_fund,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_update_team(req: &UpdateTeamRequest) -> Result<(), AppError> {
    if let Some(ref name) = req.name {
        validate_person_name(name)?;
    }
    Ok(())
}
