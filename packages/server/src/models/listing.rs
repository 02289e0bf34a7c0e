use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ListingQuery {
    /// Case-insensitive substring match on the team name.
    pub search: Option<String>,
}

/// One eligible fundraising profile as shown to a viewer.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ListingProfile {
    pub team_id: i32,
    pub team_name: String,
    pub is_fund: bool,
    pub description: String,
    pub one_pager_upload_id: Option<Uuid>,
    pub video_upload_id: Option<Uuid>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ListingResponse {
    pub data: Vec<ListingProfile>,
}
