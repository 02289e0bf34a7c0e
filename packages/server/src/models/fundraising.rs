use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::shared::double_option;
use crate::error::AppError;

/// Derived publication state of a fundraising profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileStatus {
    Draft,
    Published,
}

impl ProfileStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileStatus::Draft => "DRAFT",
            ProfileStatus::Published => "PUBLISHED",
        }
    }
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpsertProfileRequest {
    pub description: Option<String>,
    /// Attach or (with `null`) detach the one-pager reference.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub one_pager_upload_id: Option<Option<Uuid>>,
    /// Attach or (with `null`) detach the video reference.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub video_upload_id: Option<Option<Uuid>>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub team_id: i32,
    pub event_id: i32,
    pub one_pager_upload_id: Option<Uuid>,
    pub video_upload_id: Option<Uuid>,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<crate::entity::fundraising_profile::Model> for ProfileResponse {
    fn from(m: crate::entity::fundraising_profile::Model) -> Self {
        Self {
            team_id: m.team_id,
            event_id: m.event_id,
            one_pager_upload_id: m.one_pager_upload_id,
            video_upload_id: m.video_upload_id,
            description: m.description,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub fn validate_upsert_profile(req: &UpsertProfileRequest) -> Result<(), AppError> {
    if let Some(ref description) = req.description
        && description.len() > 20_000
    {
        return Err(AppError::Validation(
            "Description must be at most 20000 characters".into(),
        ));
    }
    Ok(())
}
