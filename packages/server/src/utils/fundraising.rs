use common::analytics::AnalyticsEvent;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entity::{fundraising_profile, participant};
use crate::error::AppError;
use crate::models::fundraising::ProfileStatus;
use crate::models::participant::{ParticipantKind, ParticipantStatus};

/// The publication rule. Pure and idempotent: a profile is PUBLISHED exactly
/// when the team has a name and both materials are attached, DRAFT otherwise.
pub fn publication_status(
    team_name: &str,
    one_pager: Option<Uuid>,
    video: Option<Uuid>,
) -> ProfileStatus {
    if !team_name.trim().is_empty() && one_pager.is_some() && video.is_some() {
        ProfileStatus::Published
    } else {
        ProfileStatus::Draft
    }
}

/// True when at least one ENABLED, non-deleted founder presents for the team
/// at this event.
pub async fn has_enabled_founder<C: sea_orm::ConnectionTrait>(
    db: &C,
    team_id: i32,
    event_id: i32,
) -> Result<bool, AppError> {
    let count = participant::Entity::find()
        .filter(participant::Column::EventId.eq(event_id))
        .filter(participant::Column::TeamId.eq(team_id))
        .filter(participant::Column::Kind.eq(ParticipantKind::Founder.as_str()))
        .filter(participant::Column::Status.eq(ParticipantStatus::Enabled.as_str()))
        .filter(participant::Column::DeletedAt.is_null())
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Listing eligibility: PUBLISHED profile AND an enabled founder.
/// Absent profiles are simply not eligible.
pub async fn listing_eligible<C: sea_orm::ConnectionTrait>(
    db: &C,
    team_id: i32,
    event_id: i32,
) -> Result<bool, AppError> {
    let profile = fundraising_profile::Entity::find_by_id((team_id, event_id))
        .one(db)
        .await?;
    let Some(profile) = profile else {
        return Ok(false);
    };
    if profile.status != ProfileStatus::Published.as_str() {
        return Ok(false);
    }
    has_enabled_founder(db, team_id, event_id).await
}

/// Edge-triggered listing event: emitted only when the eligibility predicate
/// actually crossed, never on a mutation that left it unchanged.
pub fn listing_edge(
    before: bool,
    after: bool,
    team_id: i32,
    event_id: i32,
) -> Option<AnalyticsEvent> {
    let name = match (before, after) {
        (false, true) => "team_added_to_listing",
        (true, false) => "team_removed_from_listing",
        _ => return None,
    };
    Some(
        AnalyticsEvent::new(name, format!("team:{team_id}")).with_properties(serde_json::json!({
            "team_id": team_id,
            "event_id": event_id,
        })),
    )
}

/// Re-derive a profile's publication status and persist it when it changed.
/// Returns the (possibly updated) model and whether a write happened.
pub async fn apply_publication_status<C: sea_orm::ConnectionTrait>(
    db: &C,
    profile: fundraising_profile::Model,
    team_name: &str,
) -> Result<(fundraising_profile::Model, bool), AppError> {
    let next = publication_status(
        team_name,
        profile.one_pager_upload_id,
        profile.video_upload_id,
    );
    if profile.status == next.as_str() {
        return Ok((profile, false));
    }

    let mut active: fundraising_profile::ActiveModel = profile.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(chrono::Utc::now());
    let model = active.update(db).await?;
    Ok((model, true))
}
