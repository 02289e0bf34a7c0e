use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{participant, team_member};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::participant::{LeadRequestStatus, ParticipantKind};
use crate::models::team_lead::{ReviewTeamLeadRequest, TeamLeadRequestResponse};
use crate::state::AppState;
use crate::utils::demo_day::{find_event_for_update, find_participant};

/// Founder self-service: ask to become the lead of the team they present
/// with. Admin review decides.
#[utoipa::path(
    post,
    path = "/{id}/team-lead-request",
    tag = "Team Lead",
    operation_id = "requestTeamLead",
    summary = "Request team-lead promotion",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 201, description = "Request recorded", body = TeamLeadRequestResponse),
        (status = 400, description = "Not a founder or already lead (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "No team assigned (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Not a participant (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "A request is already pending (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id, user_id = auth_user.user_id))]
pub async fn request_team_lead(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let existing = find_participant(&txn, event_id, auth_user.user_id).await?;

    if existing.kind != ParticipantKind::Founder.as_str() {
        return Err(AppError::Validation(
            "Only founder participants can request team lead".into(),
        ));
    }
    let team_id = existing.team_id.ok_or(AppError::PermissionDenied)?;

    if let Some(membership) = team_member::Entity::find_by_id((team_id, auth_user.user_id))
        .one(&txn)
        .await?
        && membership.is_lead
    {
        return Err(AppError::Validation(
            "Already team lead for this team".into(),
        ));
    }

    if existing.lead_request_status.as_deref() == Some(LeadRequestStatus::Requested.as_str()) {
        return Err(AppError::Conflict(
            "A team-lead request is already pending".into(),
        ));
    }

    let mut active: participant::ActiveModel = existing.into();
    active.lead_request_status = Set(Some(LeadRequestStatus::Requested.as_str().to_string()));
    let model = active.update(&txn).await?;
    txn.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(TeamLeadRequestResponse {
            event_id,
            user_id: model.user_id,
            team_id,
            lead_request_status: model
                .lead_request_status
                .unwrap_or_else(|| LeadRequestStatus::Requested.as_str().to_string()),
        }),
    ))
}

/// Admin review of a pending request. Approval flips the membership's lead
/// flag and the request status as one atomic unit: if either write fails,
/// neither is applied.
#[utoipa::path(
    post,
    path = "/{user_id}/team-lead-request/review",
    tag = "Team Lead",
    operation_id = "reviewTeamLeadRequest",
    summary = "Approve or reject a team-lead request",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = ReviewTeamLeadRequest,
    responses(
        (status = 200, description = "Request reviewed", body = TeamLeadRequestResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participant not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "No pending request (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id))]
pub async fn review_team_lead_request(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<ReviewTeamLeadRequest>,
) -> Result<Json<TeamLeadRequestResponse>, AppError> {
    auth_user.require_permission("teamlead:review")?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let existing = find_participant(&txn, event_id, user_id).await?;

    if existing.lead_request_status.as_deref() != Some(LeadRequestStatus::Requested.as_str()) {
        return Err(AppError::Conflict("No pending team-lead request".into()));
    }
    let team_id = existing
        .team_id
        .ok_or_else(|| AppError::Validation("Participant has no team assigned".into()))?;

    let decision = if payload.approve {
        LeadRequestStatus::Approved
    } else {
        LeadRequestStatus::Rejected
    };

    if payload.approve {
        promote_to_lead(&txn, team_id, user_id).await?;
    }

    let mut active: participant::ActiveModel = existing.into();
    active.lead_request_status = Set(Some(decision.as_str().to_string()));
    let model = active.update(&txn).await?;

    // Both writes ride the same transaction; commit makes them atomic.
    txn.commit().await?;

    Ok(Json(TeamLeadRequestResponse {
        event_id,
        user_id: model.user_id,
        team_id,
        lead_request_status: model
            .lead_request_status
            .unwrap_or_else(|| decision.as_str().to_string()),
    }))
}

/// Set the membership's lead flag, creating the membership row when the team
/// was assigned without one. Intentionally does NOT clear other leads: lead
/// singularity per team is not an enforced invariant.
async fn promote_to_lead(
    txn: &DatabaseTransaction,
    team_id: i32,
    user_id: i32,
) -> Result<(), AppError> {
    let now = chrono::Utc::now();
    match team_member::Entity::find_by_id((team_id, user_id))
        .one(txn)
        .await?
    {
        Some(membership) => {
            if !membership.is_lead {
                let mut active: team_member::ActiveModel = membership.into();
                active.is_lead = Set(true);
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
        }
        None => {
            team_member::ActiveModel {
                team_id: Set(team_id),
                user_id: Set(user_id),
                is_lead: Set(true),
                is_main_team: Set(false),
                is_investment_team: Set(false),
                role_title: Set(None),
                tags: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}
