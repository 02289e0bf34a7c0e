use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound on records per bulk call; bigger sheets are split by the
/// admin tooling.
pub const MAX_BATCH_SIZE: usize = 500;

/// One external investor record as it arrives from the onboarding sheet.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct InvestorRecord {
    pub email: String,
    pub name: String,
    /// Organization (fund or company) name; resolved case-insensitively.
    pub organization: Option<String>,
    pub telegram: Option<String>,
    pub linkedin: Option<String>,
    pub twitter: Option<String>,
    /// Free-text investment type (angel, seed fund, ...).
    pub investment_type: Option<String>,
    /// Free-text role within the organization.
    pub role_title: Option<String>,
    /// The record represents the fund itself rather than an individual.
    #[serde(default)]
    pub is_fund: bool,
    /// Explicit lead flag; when absent, lead status is inferred.
    pub is_lead: Option<bool>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BulkInvestorsRequest {
    pub investors: Vec<InvestorRecord>,
}

/// Outcome of a single record. Row-level failures keep the batch going; the
/// row records what happened instead of failing the call.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ImportRowOutcome {
    pub email: String,
    pub user_id: Option<i32>,
    pub team_id: Option<i32>,
    /// "success" or "error".
    pub status: &'static str,
    pub message: Option<String>,
}

impl ImportRowOutcome {
    pub fn success(email: String, user_id: i32, team_id: Option<i32>) -> Self {
        Self {
            email,
            user_id: Some(user_id),
            team_id,
            status: "success",
            message: None,
        }
    }

    pub fn error(email: String, message: String) -> Self {
        Self {
            email,
            user_id: None,
            team_id: None,
            status: "error",
            message: Some(message),
        }
    }
}

#[derive(Debug, Default, Serialize, utoipa::ToSchema)]
pub struct ImportSummary {
    pub total: usize,
    pub created_users: usize,
    pub updated_users: usize,
    pub created_teams: usize,
    pub updated_memberships: usize,
    pub promoted_to_lead: usize,
    pub errors: usize,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BulkInvestorsResponse {
    pub summary: ImportSummary,
    pub rows: Vec<ImportRowOutcome>,
}

/// Structural validation only. Malformed individual records are row-level
/// outcomes, not request failures.
pub fn validate_bulk_investors(req: &BulkInvestorsRequest) -> Result<(), AppError> {
    if req.investors.is_empty() {
        return Err(AppError::Validation("investors must not be empty".into()));
    }
    if req.investors.len() > MAX_BATCH_SIZE {
        return Err(AppError::Validation(format!(
            "Too many records: max {MAX_BATCH_SIZE}"
        )));
    }
    Ok(())
}
