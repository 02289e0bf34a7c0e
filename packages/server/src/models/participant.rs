use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, double_option, validate_email, validate_person_name};
use crate::entity::{participant, user};
use crate::error::AppError;

// ---------------------------------------------------------------------------
// Domain enums (stored as strings, parsed at the boundary)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantKind {
    Investor,
    Founder,
}

impl ParticipantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantKind::Investor => "INVESTOR",
            ParticipantKind::Founder => "FOUNDER",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "INVESTOR" => Ok(ParticipantKind::Investor),
            "FOUNDER" => Ok(ParticipantKind::Founder),
            other => Err(AppError::Validation(format!(
                "kind must be INVESTOR or FOUNDER, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantStatus {
    Pending,
    Invited,
    Enabled,
    Disabled,
}

impl ParticipantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ParticipantStatus::Pending => "PENDING",
            ParticipantStatus::Invited => "INVITED",
            ParticipantStatus::Enabled => "ENABLED",
            ParticipantStatus::Disabled => "DISABLED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "PENDING" => Ok(ParticipantStatus::Pending),
            "INVITED" => Ok(ParticipantStatus::Invited),
            "ENABLED" => Ok(ParticipantStatus::Enabled),
            "DISABLED" => Ok(ParticipantStatus::Disabled),
            other => Err(AppError::Validation(format!(
                "status must be one of PENDING, INVITED, ENABLED, DISABLED, got '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadRequestStatus {
    Requested,
    Approved,
    Rejected,
}

impl LeadRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadRequestStatus::Requested => "REQUESTED",
            LeadRequestStatus::Approved => "APPROVED",
            LeadRequestStatus::Rejected => "REJECTED",
        }
    }
}

/// Community access tiers, lowest first. Identities referenced directly when
/// adding a participant must sit above the two lowest tiers; identities the
/// registry creates itself start at the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessTier {
    Guest,
    Applicant,
    Member,
    Staff,
}

impl AccessTier {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessTier::Guest => "GUEST",
            AccessTier::Applicant => "APPLICANT",
            AccessTier::Member => "MEMBER",
            AccessTier::Staff => "STAFF",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "GUEST" => Ok(AccessTier::Guest),
            "APPLICANT" => Ok(AccessTier::Applicant),
            "MEMBER" => Ok(AccessTier::Member),
            "STAFF" => Ok(AccessTier::Staff),
            other => Err(AppError::Validation(format!("Unknown access tier '{other}'"))),
        }
    }

    /// May this identity be attached to an event by direct reference?
    pub fn is_referenceable(self) -> bool {
        self >= AccessTier::Member
    }

    /// Fixed raise table applied by the bulk importer.
    pub fn raised_for_import(self) -> Self {
        match self {
            AccessTier::Guest | AccessTier::Applicant => AccessTier::Member,
            other => other,
        }
    }
}

/// A participant's kind together with the fields legal for that kind: only
/// founders carry a team. Write paths go through `from_parts` so a team on
/// an investor can't slip in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantRole {
    Investor,
    Founder { team_id: Option<i32> },
}

impl ParticipantRole {
    pub fn from_parts(kind: ParticipantKind, team_id: Option<i32>) -> Result<Self, AppError> {
        match kind {
            ParticipantKind::Founder => Ok(ParticipantRole::Founder { team_id }),
            ParticipantKind::Investor => {
                if team_id.is_some() {
                    Err(AppError::Validation(
                        "Team assignment is only valid for founder participants".into(),
                    ))
                } else {
                    Ok(ParticipantRole::Investor)
                }
            }
        }
    }

    pub fn kind(&self) -> ParticipantKind {
        match self {
            ParticipantRole::Investor => ParticipantKind::Investor,
            ParticipantRole::Founder { .. } => ParticipantKind::Founder,
        }
    }

    pub fn team_id(&self) -> Option<i32> {
        match self {
            ParticipantRole::Investor => None,
            ParticipantRole::Founder { team_id } => *team_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddParticipantRequest {
    /// Reference to an existing identity. Mutually exclusive with email/name.
    pub user_id: Option<i32>,
    /// Email of the person; the identity is reused or created.
    pub email: Option<String>,
    pub name: Option<String>,
    /// INVESTOR or FOUNDER.
    pub kind: String,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateParticipantRequest {
    /// New status (PENDING, INVITED, ENABLED, DISABLED).
    pub status: Option<String>,
    /// Team reassignment; `null` clears the team. Founders only.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub team_id: Option<Option<i32>>,
    pub is_admin: Option<bool>,
    pub early_access: Option<bool>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ApplyRequest {
    /// INVESTOR or FOUNDER.
    pub kind: String,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct ActivationRequest {
    /// Record acceptance of the event confidentiality terms in the same
    /// command.
    #[serde(default)]
    pub accept_confidentiality: bool,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct ParticipantListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Filter by kind (INVESTOR or FOUNDER).
    pub kind: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Case-insensitive substring match on email or name.
    pub search: Option<String>,
    /// One of: created_at, status_changed_at, email.
    pub sort_by: Option<String>,
    /// asc or desc.
    pub sort_order: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipantResponse {
    pub event_id: i32,
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub kind: String,
    pub status: String,
    pub team_id: Option<i32>,
    pub is_admin: bool,
    pub early_access: bool,
    pub confidentiality_accepted: bool,
    pub lead_request_status: Option<String>,
    pub status_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ParticipantResponse {
    pub fn from_row(row: participant::Model, user: Option<&user::Model>) -> Self {
        Self {
            event_id: row.event_id,
            user_id: row.user_id,
            email: user.map(|u| u.email.clone()).unwrap_or_default(),
            name: user.map(|u| u.name.clone()).unwrap_or_default(),
            kind: row.kind,
            status: row.status,
            team_id: row.team_id,
            is_admin: row.is_admin,
            early_access: row.early_access,
            confidentiality_accepted: row.confidentiality_accepted,
            lead_request_status: row.lead_request_status,
            status_changed_at: row.status_changed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ParticipantListResponse {
    pub data: Vec<ParticipantResponse>,
    pub pagination: Pagination,
}

/// Result of the activation command: the access state after any
/// INVITED → ENABLED promotion it performed.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ActivationResponse {
    pub status: String,
    pub kind: String,
    pub early_access: bool,
    pub confidentiality_accepted: bool,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_add_participant(req: &AddParticipantRequest) -> Result<ParticipantKind, AppError> {
    let kind = ParticipantKind::parse(&req.kind)?;
    match (req.user_id, req.email.as_deref()) {
        (Some(_), None) => {}
        (None, Some(email)) => {
            validate_email(email)?;
            let name = req
                .name
                .as_deref()
                .ok_or_else(|| AppError::Validation("name is required with email".into()))?;
            validate_person_name(name)?;
        }
        (Some(_), Some(_)) => {
            return Err(AppError::Validation(
                "Provide either user_id or email, not both".into(),
            ));
        }
        (None, None) => {
            return Err(AppError::Validation(
                "Either user_id or email is required".into(),
            ));
        }
    }
    Ok(kind)
}

pub fn validate_update_participant(req: &UpdateParticipantRequest) -> Result<(), AppError> {
    if let Some(ref status) = req.status {
        ParticipantStatus::parse(status)?;
    }
    Ok(())
}
