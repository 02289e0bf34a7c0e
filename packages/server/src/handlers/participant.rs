use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::analytics::{self, Pending};
use crate::entity::{participant, role, team_member, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::participant::*;
use crate::models::shared::{Pagination, escape_like};
use crate::state::AppState;
use crate::utils::demo_day::{find_event, find_event_for_update, find_participant, find_team};
use crate::utils::fundraising::{listing_edge, listing_eligible};

/// Add a participant to an event (admin action).
///
/// The identity is either referenced directly (`user_id`, which requires an
/// established access tier) or resolved by email, creating a minimal GUEST
/// identity when nobody matches. New identities start INVITED, existing ones
/// ENABLED. Founders are attached to their primary team and promoted to its
/// lead.
#[utoipa::path(
    post,
    path = "/",
    tag = "Participants",
    operation_id = "addParticipant",
    summary = "Add a participant to an event",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = AddParticipantRequest,
    responses(
        (status = 201, description = "Participant added", body = ParticipantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event or user not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a participant (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id))]
pub async fn add_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<AddParticipantRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("participant:manage")?;
    let kind = validate_add_participant(&payload)?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;

    let (user_model, identity_created) = resolve_identity(&txn, &payload).await?;

    // The uniqueness invariant is on the physical row, so a soft-deleted
    // participant still blocks re-adding the pair.
    if participant::Entity::find_by_id((event_id, user_model.id))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Already a participant".into()));
    }

    let status = if identity_created {
        ParticipantStatus::Invited
    } else {
        ParticipantStatus::Enabled
    };

    let mut team_id = None;
    if kind == ParticipantKind::Founder
        && let Some(membership) = primary_membership(&txn, user_model.id).await?
    {
        team_id = Some(membership.team_id);
        if !membership.is_lead {
            let mut active: team_member::ActiveModel = membership.into();
            active.is_lead = Set(true);
            active.updated_at = Set(chrono::Utc::now());
            active.update(&txn).await?;
        }
    }

    let eligible_before = match team_id {
        Some(tid) => Some(listing_eligible(&txn, tid, event_id).await?),
        None => None,
    };

    let now = chrono::Utc::now();
    let new_row = participant::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(user_model.id),
        kind: Set(kind.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        team_id: Set(team_id),
        is_admin: Set(false),
        early_access: Set(false),
        confidentiality_accepted: Set(false),
        lead_request_status: Set(None),
        status_changed_at: Set(now),
        deleted_at: Set(None),
        created_at: Set(now),
    };

    let model = match new_row.insert(&txn).await {
        Ok(model) => model,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::Conflict("Already a participant".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut pending = Pending::new();
    pending.push(analytics::participant_added(
        event_id,
        user_model.id,
        kind.as_str(),
        status.as_str(),
        identity_created,
    ));
    if let (Some(tid), Some(before)) = (team_id, eligible_before) {
        let after = listing_eligible(&txn, tid, event_id).await?;
        pending.push_opt(listing_edge(before, after, tid, event_id));
    }

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok((
        StatusCode::CREATED,
        Json(ParticipantResponse::from_row(model, Some(&user_model))),
    ))
}

/// Update a participant's status, team or flags (admin action).
///
/// `status_changed_at` moves and a status event fires only when the status
/// actually changes; a no-op update emits nothing.
#[utoipa::path(
    patch,
    path = "/{user_id}",
    tag = "Participants",
    operation_id = "updateParticipant",
    summary = "Update a participant",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateParticipantRequest,
    responses(
        (status = 200, description = "Participant updated", body = ParticipantResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id))]
pub async fn update_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateParticipantRequest>,
) -> Result<Json<ParticipantResponse>, AppError> {
    auth_user.require_permission("participant:manage")?;
    validate_update_participant(&payload)?;

    if payload == UpdateParticipantRequest::default() {
        let existing = find_participant(&state.db, event_id, user_id).await?;
        let user_model = find_user(&state.db, user_id).await?;
        return Ok(Json(ParticipantResponse::from_row(existing, Some(&user_model))));
    }

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let existing = find_participant(&txn, event_id, user_id).await?;
    let user_model = find_user(&txn, user_id).await?;

    let kind = ParticipantKind::parse(&existing.kind)
        .map_err(|_| AppError::Internal(format!("Corrupt participant kind: {}", existing.kind)))?;
    let old_status = existing.status.clone();
    let old_team = existing.team_id;

    // Team reassignment is only legal for founders; the tagged role type
    // rejects a team on an investor.
    let new_team = match payload.team_id {
        Some(team_id) => {
            let role = ParticipantRole::from_parts(kind, team_id)?;
            if let Some(tid) = role.team_id() {
                find_team(&txn, tid).await?;
            }
            role.team_id()
        }
        None => old_team,
    };

    // Eligibility snapshots for every (team, event) pair this write can touch.
    let mut affected_teams: Vec<i32> = Vec::new();
    if kind == ParticipantKind::Founder {
        affected_teams.extend(old_team);
        if new_team != old_team {
            affected_teams.extend(new_team);
        }
    }
    let mut edges_before = Vec::with_capacity(affected_teams.len());
    for &tid in &affected_teams {
        edges_before.push(listing_eligible(&txn, tid, event_id).await?);
    }

    let new_status = payload.status.as_deref().unwrap_or(&old_status).to_string();
    let status_changed = new_status != old_status;

    let mut active: participant::ActiveModel = existing.into();
    if status_changed {
        active.status = Set(new_status.clone());
        active.status_changed_at = Set(chrono::Utc::now());
    }
    if payload.team_id.is_some() {
        active.team_id = Set(new_team);
    }
    if let Some(is_admin) = payload.is_admin {
        active.is_admin = Set(is_admin);
    }
    if let Some(early_access) = payload.early_access {
        active.early_access = Set(early_access);
    }

    let model = active.update(&txn).await?;

    let mut pending = Pending::new();
    if status_changed {
        pending.push(analytics::participant_status_changed(
            event_id,
            user_id,
            &old_status,
            &new_status,
        ));
    }
    for (&tid, &before) in affected_teams.iter().zip(edges_before.iter()) {
        let after = listing_eligible(&txn, tid, event_id).await?;
        pending.push_opt(listing_edge(before, after, tid, event_id));
    }

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok(Json(ParticipantResponse::from_row(model, Some(&user_model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Participants",
    operation_id = "listParticipants",
    summary = "List participants of an event",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ParticipantListQuery,
    ),
    responses(
        (status = 200, description = "List of participants", body = ParticipantListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(event_id))]
pub async fn list_participants(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<Json<ParticipantListResponse>, AppError> {
    auth_user.require_permission("participant:manage")?;
    find_event(&state.db, event_id).await?;

    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = participant::Entity::find()
        .find_also_related(user::Entity)
        .filter(participant::Column::EventId.eq(event_id))
        .filter(participant::Column::DeletedAt.is_null());

    if let Some(ref kind) = query.kind {
        select = select.filter(participant::Column::Kind.eq(ParticipantKind::parse(kind)?.as_str()));
    }
    if let Some(ref status) = query.status {
        select =
            select.filter(participant::Column::Status.eq(ParticipantStatus::parse(status)?.as_str()));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            user::Entity,
                            user::Column::Email,
                        ))))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((user::Entity, user::Column::Name))))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    select = match query.sort_by.as_deref().unwrap_or("created_at") {
        "created_at" => select.order_by(participant::Column::CreatedAt, sort_order),
        "status_changed_at" => select.order_by(participant::Column::StatusChangedAt, sort_order),
        "email" => select.order_by(user::Column::Email, sort_order),
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, status_changed_at, email".into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let total_pages = total.div_ceil(per_page);

    let rows = select
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let data = rows
        .into_iter()
        .map(|(row, usr)| ParticipantResponse::from_row(row, usr.as_ref()))
        .collect();

    Ok(Json(ParticipantListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

/// Soft-delete a participant. The row is kept (the uniqueness invariant is
/// physical); only `deleted_at` is set.
#[utoipa::path(
    delete,
    path = "/{user_id}",
    tag = "Participants",
    operation_id = "removeParticipant",
    summary = "Soft-delete a participant",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("user_id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 204, description = "Participant removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Participant not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id, user_id))]
pub async fn remove_participant(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission("participant:manage")?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let existing = find_participant(&txn, event_id, user_id).await?;

    let founder_team = (existing.kind == ParticipantKind::Founder.as_str())
        .then_some(existing.team_id)
        .flatten();
    let eligible_before = match founder_team {
        Some(tid) => Some(listing_eligible(&txn, tid, event_id).await?),
        None => None,
    };

    let mut active: participant::ActiveModel = existing.into();
    active.deleted_at = Set(Some(chrono::Utc::now()));
    active.update(&txn).await?;

    let mut pending = Pending::new();
    if let (Some(tid), Some(before)) = (founder_team, eligible_before) {
        let after = listing_eligible(&txn, tid, event_id).await?;
        pending.push_opt(listing_edge(before, after, tid, event_id));
    }

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok(StatusCode::NO_CONTENT)
}

/// The access-check path, deliberately a command: an INVITED participant is
/// promoted to ENABLED as a side effect and the resulting access state is
/// returned.
#[utoipa::path(
    post,
    path = "/{id}/activation",
    tag = "Participants",
    operation_id = "activateParticipation",
    summary = "Check access, activating an invited participant",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = ActivationRequest,
    responses(
        (status = 200, description = "Current access state", body = ActivationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not a participant (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id = auth_user.user_id))]
pub async fn activate(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<ActivationRequest>,
) -> Result<Json<ActivationResponse>, AppError> {
    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;
    let existing = find_participant(&txn, event_id, auth_user.user_id).await?;

    let invited = existing.status == ParticipantStatus::Invited.as_str();
    let accept = payload.accept_confidentiality && !existing.confidentiality_accepted;

    let founder_team = (existing.kind == ParticipantKind::Founder.as_str())
        .then_some(existing.team_id)
        .flatten();
    let eligible_before = match (invited, founder_team) {
        (true, Some(tid)) => Some(listing_eligible(&txn, tid, event_id).await?),
        _ => None,
    };

    let model = if invited || accept {
        let mut active: participant::ActiveModel = existing.into();
        if invited {
            active.status = Set(ParticipantStatus::Enabled.as_str().to_string());
            active.status_changed_at = Set(chrono::Utc::now());
        }
        if accept {
            active.confidentiality_accepted = Set(true);
        }
        active.update(&txn).await?
    } else {
        existing
    };

    let mut pending = Pending::new();
    if invited {
        pending.push(analytics::participant_status_changed(
            event_id,
            auth_user.user_id,
            ParticipantStatus::Invited.as_str(),
            ParticipantStatus::Enabled.as_str(),
        ));
        if let (Some(tid), Some(before)) = (founder_team, eligible_before) {
            let after = listing_eligible(&txn, tid, event_id).await?;
            pending.push_opt(listing_edge(before, after, tid, event_id));
        }
    }

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok(Json(ActivationResponse {
        status: model.status,
        kind: model.kind,
        early_access: model.early_access,
        confidentiality_accepted: model.confidentiality_accepted,
    }))
}

/// Self-service application: the caller asks to join the event, landing in
/// PENDING for admin review.
#[utoipa::path(
    post,
    path = "/{id}/apply",
    tag = "Participants",
    operation_id = "applyForEvent",
    summary = "Apply to join an event",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = ApplyRequest,
    responses(
        (status = 201, description = "Application recorded", body = ActivationResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already a participant (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, user_id = auth_user.user_id))]
pub async fn apply(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<ApplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = ParticipantKind::parse(&payload.kind)?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;

    // Applicant founders are attached to their primary team, but lead
    // promotion stays an admin-side effect of addParticipant.
    let mut team_id = None;
    if kind == ParticipantKind::Founder
        && let Some(membership) = primary_membership(&txn, auth_user.user_id).await?
    {
        team_id = Some(membership.team_id);
    }

    let now = chrono::Utc::now();
    let new_row = participant::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(auth_user.user_id),
        kind: Set(kind.as_str().to_string()),
        status: Set(ParticipantStatus::Pending.as_str().to_string()),
        team_id: Set(team_id),
        is_admin: Set(false),
        early_access: Set(false),
        confidentiality_accepted: Set(false),
        lead_request_status: Set(None),
        status_changed_at: Set(now),
        deleted_at: Set(None),
        created_at: Set(now),
    };

    let model = match new_row.insert(&txn).await {
        Ok(model) => model,
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::Conflict("Already a participant".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut pending = Pending::new();
    pending.push(analytics::participant_applied(
        event_id,
        auth_user.user_id,
        kind.as_str(),
    ));

    txn.commit().await?;
    pending.dispatch(&state.analytics);

    Ok((
        StatusCode::CREATED,
        Json(ActivationResponse {
            status: model.status,
            kind: model.kind,
            early_access: model.early_access,
            confidentiality_accepted: model.confidentiality_accepted,
        }),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve the identity a participant is created for. Returns the user and
/// whether this call created it.
async fn resolve_identity(
    txn: &DatabaseTransaction,
    payload: &AddParticipantRequest,
) -> Result<(user::Model, bool), AppError> {
    if let Some(user_id) = payload.user_id {
        let user_model = find_user(txn, user_id).await?;
        let tier = AccessTier::parse(&user_model.access_tier)
            .map_err(|_| AppError::Internal(format!("Corrupt access tier: {}", user_model.access_tier)))?;
        if !tier.is_referenceable() {
            return Err(AppError::Validation(
                "User's access tier is too low to be added by reference".into(),
            ));
        }
        return Ok((user_model, false));
    }

    let email = payload
        .email
        .as_deref()
        .expect("validated")
        .trim()
        .to_lowercase();

    if let Some(existing) = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(txn)
        .await?
    {
        return Ok((existing, false));
    }

    let now = chrono::Utc::now();
    let created = user::ActiveModel {
        email: Set(email),
        name: Set(payload.name.as_deref().expect("validated").trim().to_string()),
        password_hash: Set(None),
        access_tier: Set(AccessTier::Guest.as_str().to_string()),
        role: Set(role::DEFAULT_ROLE.to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    Ok((created, true))
}

async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// The identity's primary team membership: the one flagged `is_main_team`,
/// falling back to the earliest membership.
async fn primary_membership<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Option<team_member::Model>, AppError> {
    Ok(team_member::Entity::find()
        .filter(team_member::Column::UserId.eq(user_id))
        .order_by_desc(team_member::Column::IsMainTeam)
        .order_by_asc(team_member::Column::CreatedAt)
        .one(db)
        .await?)
}
