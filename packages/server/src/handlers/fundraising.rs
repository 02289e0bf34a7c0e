use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;

use crate::analytics::Pending;
use crate::entity::fundraising_profile;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::fundraising::*;
use crate::models::team::{TeamResponse, UpdateTeamRequest, validate_update_team};
use crate::models::upload::UploadKind;
use crate::state::AppState;
use crate::utils::demo_day::{
    find_event, find_event_for_update, find_participant, find_team, find_team_for_update,
};
use crate::utils::fundraising::{
    apply_publication_status, has_enabled_founder, listing_edge, listing_eligible,
    publication_status,
};
use crate::utils::uploads::find_upload_of_kind;

#[utoipa::path(
    get,
    path = "/",
    tag = "Fundraising",
    operation_id = "getFundraisingProfile",
    summary = "Get a team's fundraising profile for an event",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    responses(
        (status = 200, description = "Fundraising profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Profile not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id, team_id))]
pub async fn get_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, team_id)): Path<(i32, i32)>,
) -> Result<Json<ProfileResponse>, AppError> {
    find_event(&state.db, event_id).await?;
    require_team_access(&state.db, &auth_user, event_id, team_id).await?;

    let profile = fundraising_profile::Entity::find_by_id((team_id, event_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Fundraising profile not found".into()))?;

    Ok(Json(profile.into()))
}

/// Create or update the profile. Publication status is re-derived from the
/// materials inside the same transaction, and listing edges fire only when
/// the eligibility predicate actually crossed.
#[utoipa::path(
    put,
    path = "/",
    tag = "Fundraising",
    operation_id = "upsertFundraisingProfile",
    summary = "Create or update a team's fundraising profile",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    request_body = UpsertProfileRequest,
    responses(
        (status = 200, description = "Profile upserted", body = ProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event, team or upload not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Concurrent profile creation (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, team_id))]
pub async fn upsert_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, team_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpsertProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    validate_upsert_profile(&payload)?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let team = find_team(&txn, team_id).await?;
    require_team_access(&txn, &auth_user, event_id, team_id).await?;

    // Upload references are validated for existence and kind before they are
    // attached.
    if let Some(Some(id)) = payload.one_pager_upload_id {
        find_upload_of_kind(&txn, id, UploadKind::OnePager).await?;
    }
    if let Some(Some(id)) = payload.video_upload_id {
        find_upload_of_kind(&txn, id, UploadKind::Video).await?;
    }

    let eligible_before = listing_eligible(&txn, team_id, event_id).await?;
    let existing = fundraising_profile::Entity::find_by_id((team_id, event_id))
        .one(&txn)
        .await?;

    let now = chrono::Utc::now();
    let model = match existing {
        Some(profile) => {
            let mut active: fundraising_profile::ActiveModel = profile.into();
            if let Some(description) = payload.description {
                active.description = Set(description);
            }
            if let Some(one_pager) = payload.one_pager_upload_id {
                active.one_pager_upload_id = Set(one_pager);
            }
            if let Some(video) = payload.video_upload_id {
                active.video_upload_id = Set(video);
            }
            active.updated_at = Set(now);
            let updated = active.update(&txn).await?;
            let (updated, _) = apply_publication_status(&txn, updated, &team.name).await?;
            updated
        }
        None => {
            let one_pager = payload.one_pager_upload_id.flatten();
            let video = payload.video_upload_id.flatten();
            let status = publication_status(&team.name, one_pager, video);
            let new_profile = fundraising_profile::ActiveModel {
                team_id: Set(team_id),
                event_id: Set(event_id),
                one_pager_upload_id: Set(one_pager),
                video_upload_id: Set(video),
                description: Set(payload.description.unwrap_or_default()),
                status: Set(status.as_str().to_string()),
                created_at: Set(now),
                updated_at: Set(now),
            };
            match new_profile.insert(&txn).await {
                Ok(model) => model,
                Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                    return Err(AppError::Conflict(
                        "Fundraising profile was created concurrently".into(),
                    ));
                }
                Err(e) => return Err(e.into()),
            }
        }
    };

    let eligible_after = listing_eligible(&txn, team_id, event_id).await?;
    let mut pending = Pending::new();
    pending.push_opt(listing_edge(
        eligible_before,
        eligible_after,
        team_id,
        event_id,
    ));

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok(Json(model.into()))
}

/// Admin repair hook: re-derive the publication status from current
/// materials. Idempotent; a recompute that changes nothing emits nothing.
#[utoipa::path(
    post,
    path = "/recompute",
    tag = "Fundraising",
    operation_id = "recomputeFundraisingProfileStatus",
    summary = "Recompute a profile's publication status",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("team_id" = i32, Path, description = "Team ID"),
    ),
    responses(
        (status = 200, description = "Profile after recompute", body = ProfileResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Profile not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id, team_id))]
pub async fn recompute_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, team_id)): Path<(i32, i32)>,
) -> Result<Json<ProfileResponse>, AppError> {
    auth_user.require_permission("fundraising:manage")?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let team = find_team(&txn, team_id).await?;

    let profile = fundraising_profile::Entity::find_by_id((team_id, event_id))
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Fundraising profile not found".into()))?;

    let eligible_before = listing_eligible(&txn, team_id, event_id).await?;
    let (model, _changed) = apply_publication_status(&txn, profile, &team.name).await?;
    let eligible_after = listing_eligible(&txn, team_id, event_id).await?;

    let mut pending = Pending::new();
    pending.push_opt(listing_edge(
        eligible_before,
        eligible_after,
        team_id,
        event_id,
    ));

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok(Json(model.into()))
}

/// Update team fields. A name change can publish or unpublish the team's
/// fundraising profiles, so each one is re-derived in the same transaction.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Teams",
    operation_id = "updateTeam",
    summary = "Update a team",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = TeamResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(team_id))]
pub async fn update_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
    AppJson(payload): AppJson<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>, AppError> {
    auth_user.require_permission("participant:manage")?;
    validate_update_team(&payload)?;

    if payload == UpdateTeamRequest::default() {
        let existing = find_team(&state.db, team_id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;
    let existing = find_team_for_update(&txn, team_id).await?;

    let new_name = payload
        .name
        .as_deref()
        .map(|n| n.trim().to_string())
        .unwrap_or_else(|| existing.name.clone());
    let name_changed = new_name != existing.name;

    let mut pending = Pending::new();

    if name_changed {
        // Re-derive every profile of this team under the new name. The
        // founder side of the predicate is untouched by a rename, so it is
        // computed once per event.
        let profiles = fundraising_profile::Entity::find()
            .filter(fundraising_profile::Column::TeamId.eq(team_id))
            .all(&txn)
            .await?;
        for profile in profiles {
            let event_id = profile.event_id;
            let has_founder = has_enabled_founder(&txn, team_id, event_id).await?;
            let before = profile.status == ProfileStatus::Published.as_str() && has_founder;
            let (updated, _) = apply_publication_status(&txn, profile, &new_name).await?;
            let after = updated.status == ProfileStatus::Published.as_str() && has_founder;
            pending.push_opt(listing_edge(before, after, team_id, event_id));
        }
    }

    let mut active: crate::entity::team::ActiveModel = existing.into();
    if name_changed {
        active.name = Set(new_name);
    }
    if let Some(is_fund) = payload.is_fund {
        active.is_fund = Set(is_fund);
    }
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(&txn).await?;

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok(Json(model.into()))
}

/// A founder may read and edit their own team's profile; everything else
/// needs `fundraising:manage`.
async fn require_team_access<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    event_id: i32,
    team_id: i32,
) -> Result<(), AppError> {
    if auth_user.has_permission("fundraising:manage") {
        return Ok(());
    }
    let participant = find_participant(db, event_id, auth_user.user_id)
        .await
        .map_err(|_| AppError::PermissionDenied)?;
    if participant.team_id == Some(team_id) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}
