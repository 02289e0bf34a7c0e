use serde::{Deserialize, Serialize};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReviewTeamLeadRequest {
    pub approve: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamLeadRequestResponse {
    pub event_id: i32,
    pub user_id: i32,
    pub team_id: i32,
    pub lead_request_status: String,
}
