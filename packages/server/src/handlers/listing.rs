use std::collections::HashSet;

use axum::Json;
use axum::extract::{Path, Query, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{fundraising_profile, participant, team};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::event::EventStatus;
use crate::models::fundraising::ProfileStatus;
use crate::models::listing::*;
use crate::models::participant::{ParticipantKind, ParticipantStatus};
use crate::models::shared::escape_like;
use crate::state::AppState;
use crate::utils::demo_day::{find_event, find_participant};
use crate::utils::ordering::sort_for_viewer;

/// The viewer-facing listing: eligible fundraising profiles in the viewer's
/// personal, stable order.
///
/// Eligible means PUBLISHED with at least one enabled founder. The order is
/// derived from a per-viewer hash, so two calls by the same viewer agree and
/// different viewers generally disagree.
#[utoipa::path(
    get,
    path = "/{id}/fundraising-profiles",
    tag = "Fundraising",
    operation_id = "getProfilesForViewer",
    summary = "List eligible fundraising profiles for the caller",
    params(
        ("id" = i32, Path, description = "Event ID"),
        ListingQuery,
    ),
    responses(
        (status = 200, description = "Eligible profiles in viewer order", body = ListingResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Access not enabled (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(event_id, user_id = auth_user.user_id))]
pub async fn get_profiles_for_viewer(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingResponse>, AppError> {
    let event = find_event(&state.db, event_id).await?;
    let viewer = find_participant(&state.db, event_id, auth_user.user_id)
        .await
        .map_err(|_| AppError::PermissionDenied)?;

    if viewer.status != ParticipantStatus::Enabled.as_str() {
        return Err(AppError::PermissionDenied);
    }
    // During the early-access window only flagged participants may browse.
    if event.status == EventStatus::EarlyAccess.as_str() && !viewer.early_access {
        return Err(AppError::PermissionDenied);
    }

    let mut select = fundraising_profile::Entity::find()
        .find_also_related(team::Entity)
        .filter(fundraising_profile::Column::EventId.eq(event_id))
        .filter(fundraising_profile::Column::Status.eq(ProfileStatus::Published.as_str()));

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col((team::Entity, team::Column::Name))))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let published = select.all(&state.db).await?;
    if published.is_empty() {
        return Ok(Json(ListingResponse { data: Vec::new() }));
    }

    // One pass over the participant table decides which of the published
    // teams actually have an enabled founder.
    let team_ids: Vec<i32> = published.iter().map(|(p, _)| p.team_id).collect();
    let founder_teams: HashSet<i32> = participant::Entity::find()
        .filter(participant::Column::EventId.eq(event_id))
        .filter(participant::Column::TeamId.is_in(team_ids))
        .filter(participant::Column::Kind.eq(ParticipantKind::Founder.as_str()))
        .filter(participant::Column::Status.eq(ParticipantStatus::Enabled.as_str()))
        .filter(participant::Column::DeletedAt.is_null())
        .select_only()
        .column(participant::Column::TeamId)
        .into_tuple::<Option<i32>>()
        .all(&state.db)
        .await?
        .into_iter()
        .flatten()
        .collect();

    let mut data: Vec<ListingProfile> = published
        .into_iter()
        .filter(|(profile, _)| founder_teams.contains(&profile.team_id))
        .map(|(profile, team_model)| {
            let (team_name, is_fund) = team_model
                .map(|t| (t.name, t.is_fund))
                .unwrap_or_default();
            ListingProfile {
                team_id: profile.team_id,
                team_name,
                is_fund,
                description: profile.description,
                one_pager_upload_id: profile.one_pager_upload_id,
                video_upload_id: profile.video_upload_id,
            }
        })
        .collect();

    let seed = auth_user.user_id.to_string();
    sort_for_viewer(&seed, &mut data, |p| p.team_id.to_string());

    Ok(Json(ListingResponse { data }))
}
