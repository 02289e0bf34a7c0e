use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::Func;
use sea_orm::*;
use tracing::instrument;

use crate::analytics::{self, Pending};
use crate::entity::{investor_profile, participant, role, team, team_member, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::import::*;
use crate::models::participant::{AccessTier, ParticipantKind, ParticipantStatus};
use crate::models::shared::{validate_email, validate_person_name};
use crate::state::AppState;
use crate::utils::demo_day::find_event_for_update;
use crate::utils::social::{normalize_linkedin, normalize_telegram, normalize_twitter};

/// Role titles that veto the "first contact becomes lead" inference.
const NON_LEAD_ROLE_KEYWORDS: &[&str] =
    &["assistant", "associate", "analyst", "intern", "scout", "advisor"];

/// Caches scoped to a single import call. Explicit maps passed through the
/// pipeline, never module state, so concurrent imports cannot see each
/// other's entries.
#[derive(Default)]
struct BatchContext {
    /// Lowercased organization name -> team id resolved or created in this
    /// batch.
    teams_by_name: HashMap<String, i32>,
    /// Telegram handle -> owning user id, as claimed during this batch.
    telegram_owners: HashMap<String, i32>,
}

/// How a single record failed.
enum RecordError {
    /// Business-rule failure: recorded on the row, the batch continues.
    Row(String),
    /// Unclassified failure: aborts the whole transaction.
    Fatal(AppError),
}

impl From<DbErr> for RecordError {
    fn from(e: DbErr) -> Self {
        RecordError::Fatal(e.into())
    }
}

struct RecordApplied {
    user_id: i32,
    team_id: Option<i32>,
    status: ParticipantStatus,
    identity_created: bool,
}

/// Merge a batch of external investor records into identities, teams,
/// memberships and participants.
///
/// The whole batch runs in one transaction. Business-rule failures become
/// row outcomes and the batch continues; anything unclassified aborts the
/// transaction and nothing is applied. Analytics are buffered and dispatched
/// only after commit.
#[utoipa::path(
    post,
    path = "/investors/bulk",
    tag = "Participants",
    operation_id = "addInvestorParticipantsBulk",
    summary = "Bulk-import investor participants",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = BulkInvestorsRequest,
    responses(
        (status = 200, description = "Batch processed (may contain row-level errors)", body = BulkInvestorsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id, records = payload.investors.len()))]
pub async fn bulk_add_investors(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<BulkInvestorsRequest>,
) -> Result<Json<BulkInvestorsResponse>, AppError> {
    auth_user.require_permission("investor:import")?;
    validate_bulk_investors(&payload)?;

    let txn = state.db.begin().await?;
    find_event_for_update(&txn, event_id).await?;

    let mut ctx = BatchContext::default();
    let mut summary = ImportSummary {
        total: payload.investors.len(),
        ..Default::default()
    };
    let mut rows = Vec::with_capacity(payload.investors.len());
    let mut pending = Pending::new();

    for record in &payload.investors {
        match import_record(&txn, event_id, record, &mut ctx, &mut summary).await {
            Ok(applied) => {
                pending.push(analytics::participant_added(
                    event_id,
                    applied.user_id,
                    ParticipantKind::Investor.as_str(),
                    applied.status.as_str(),
                    applied.identity_created,
                ));
                rows.push(ImportRowOutcome::success(
                    record.email.trim().to_lowercase(),
                    applied.user_id,
                    applied.team_id,
                ));
            }
            Err(RecordError::Row(message)) => {
                summary.errors += 1;
                rows.push(ImportRowOutcome::error(
                    record.email.trim().to_lowercase(),
                    message,
                ));
            }
            Err(RecordError::Fatal(e)) => return Err(e),
        }
    }

    txn.commit().await?;
    // Deferred on purpose: nothing is reported for rows a rollback would
    // have discarded.
    pending.dispatch(&state.analytics);

    tracing::info!(
        event_id,
        total = summary.total,
        created_users = summary.created_users,
        created_teams = summary.created_teams,
        errors = summary.errors,
        user_id = auth_user.user_id,
        "Bulk investor import finished"
    );

    Ok(Json(BulkInvestorsResponse { summary, rows }))
}

async fn import_record(
    txn: &DatabaseTransaction,
    event_id: i32,
    record: &InvestorRecord,
    ctx: &mut BatchContext,
    summary: &mut ImportSummary,
) -> Result<RecordApplied, RecordError> {
    // 1. Normalize handles.
    let telegram = record.telegram.as_deref().and_then(normalize_telegram);
    let linkedin = record.linkedin.as_deref().and_then(normalize_linkedin);
    let twitter = record.twitter.as_deref().and_then(normalize_twitter);

    let email = record.email.trim().to_lowercase();
    validate_email(&email).map_err(|e| RecordError::Row(error_message(e)))?;
    validate_person_name(&record.name).map_err(|e| RecordError::Row(error_message(e)))?;

    // 2. A participant already registered for this event skips the row.
    let existing_user = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(txn)
        .await?;
    if let Some(ref u) = existing_user
        && participant::Entity::find_by_id((event_id, u.id))
            .one(txn)
            .await?
            .is_some()
    {
        return Err(RecordError::Row(
            "Participant already exists for this event".into(),
        ));
    }

    // 3. Resolve the identity.
    let (user_model, identity_created) = match existing_user {
        Some(u) => {
            let (updated, changed) =
                merge_identity(txn, u, &telegram, &linkedin, &twitter, ctx).await?;
            if changed {
                summary.updated_users += 1;
            }
            (updated, false)
        }
        None => {
            let created =
                create_identity(txn, &email, record, &telegram, &linkedin, &twitter, ctx).await?;
            summary.created_users += 1;
            (created, true)
        }
    };

    // Individual investors carry their preferences themselves; fund-level
    // records put them on the team below instead.
    if !record.is_fund && record.investment_type.is_some() {
        upsert_user_investor_profile(txn, user_model.id, record).await?;
    }

    // 4. Organization: team, investor profile, membership.
    let mut team_id = None;
    if let Some(org) = record.organization.as_deref().map(str::trim)
        && !org.is_empty()
    {
        let tid = resolve_team(txn, org, record.is_fund, ctx, summary).await?;
        team_id = Some(tid);

        if record.is_fund {
            upsert_team_investor_profile(txn, tid, record).await?;
        }

        upsert_membership(txn, tid, user_model.id, record, summary).await?;
    }

    // 5. The participant row itself.
    let status = if identity_created {
        ParticipantStatus::Invited
    } else {
        ParticipantStatus::Enabled
    };
    let now = chrono::Utc::now();
    participant::ActiveModel {
        event_id: Set(event_id),
        user_id: Set(user_model.id),
        kind: Set(ParticipantKind::Investor.as_str().to_string()),
        status: Set(status.as_str().to_string()),
        team_id: Set(None),
        is_admin: Set(false),
        early_access: Set(false),
        confidentiality_accepted: Set(false),
        lead_request_status: Set(None),
        status_changed_at: Set(now),
        deleted_at: Set(None),
        created_at: Set(now),
    }
    .insert(txn)
    .await?;

    Ok(RecordApplied {
        user_id: user_model.id,
        team_id,
        status,
        identity_created,
    })
}

/// Merge handle fields into an existing identity and raise its access tier
/// by the fixed rule table. Existing handles are kept; only empty fields are
/// filled in.
async fn merge_identity(
    txn: &DatabaseTransaction,
    existing: user::Model,
    telegram: &Option<String>,
    linkedin: &Option<String>,
    twitter: &Option<String>,
    ctx: &mut BatchContext,
) -> Result<(user::Model, bool), RecordError> {
    let mut changed = false;

    let tier = AccessTier::parse(&existing.access_tier).map_err(|_| {
        RecordError::Fatal(AppError::Internal(format!(
            "Corrupt access tier: {}",
            existing.access_tier
        )))
    })?;
    let raised = tier.raised_for_import();

    let telegram_to_set = match telegram {
        Some(h) if existing.telegram.is_none() => claim_telegram(txn, h, existing.id, ctx).await?,
        _ => None,
    };

    let mut active: user::ActiveModel = existing.clone().into();

    if raised != tier {
        active.access_tier = Set(raised.as_str().to_string());
        changed = true;
    }
    if let Some(h) = telegram_to_set {
        active.telegram = Set(Some(h));
        changed = true;
    }
    if let Some(h) = linkedin
        && existing.linkedin.is_none()
    {
        active.linkedin = Set(Some(h.clone()));
        changed = true;
    }
    if let Some(h) = twitter
        && existing.twitter.is_none()
    {
        active.twitter = Set(Some(h.clone()));
        changed = true;
    }

    if !changed {
        return Ok((existing, false));
    }

    active.updated_at = Set(chrono::Utc::now());
    let updated = active.update(txn).await?;
    Ok((updated, true))
}

async fn create_identity(
    txn: &DatabaseTransaction,
    email: &str,
    record: &InvestorRecord,
    telegram: &Option<String>,
    linkedin: &Option<String>,
    twitter: &Option<String>,
    ctx: &mut BatchContext,
) -> Result<user::Model, RecordError> {
    let telegram_to_set = match telegram {
        // id 0: the row does not exist yet; any existing owner wins.
        Some(h) => claim_telegram(txn, h, 0, ctx).await?,
        None => None,
    };

    let now = chrono::Utc::now();
    let created = user::ActiveModel {
        email: Set(email.to_string()),
        name: Set(record.name.trim().to_string()),
        password_hash: Set(None),
        access_tier: Set(AccessTier::Guest.as_str().to_string()),
        role: Set(role::DEFAULT_ROLE.to_string()),
        telegram: Set(telegram_to_set.clone()),
        linkedin: Set(linkedin.clone()),
        twitter: Set(twitter.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?;

    // The cache entry created for id 0 now belongs to the real row.
    if let Some(h) = telegram_to_set {
        ctx.telegram_owners.insert(h, created.id);
    }

    Ok(created)
}

/// Telegram handles have at most one owner. If the handle already belongs to
/// a different identity (in the database or claimed earlier in this batch)
/// it is silently left unset; that is not a row error.
async fn claim_telegram(
    txn: &DatabaseTransaction,
    handle: &str,
    claimant: i32,
    ctx: &mut BatchContext,
) -> Result<Option<String>, RecordError> {
    if let Some(&owner) = ctx.telegram_owners.get(handle) {
        return Ok((owner == claimant).then(|| handle.to_string()));
    }

    let owner = user::Entity::find()
        .filter(user::Column::Telegram.eq(handle))
        .one(txn)
        .await?;
    match owner {
        Some(u) if u.id != claimant => {
            ctx.telegram_owners.insert(handle.to_string(), u.id);
            Ok(None)
        }
        _ => {
            ctx.telegram_owners.insert(handle.to_string(), claimant);
            Ok(Some(handle.to_string()))
        }
    }
}

/// Resolve or create the organization's team by case-insensitive name,
/// memoized per batch.
async fn resolve_team(
    txn: &DatabaseTransaction,
    org: &str,
    is_fund: bool,
    ctx: &mut BatchContext,
    summary: &mut ImportSummary,
) -> Result<i32, RecordError> {
    let key = org.to_lowercase();
    if let Some(&tid) = ctx.teams_by_name.get(&key) {
        return Ok(tid);
    }

    let existing = team::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(team::Column::Name))).eq(key.clone()))
        .one(txn)
        .await?;

    let tid = match existing {
        Some(t) => t.id,
        None => {
            let now = chrono::Utc::now();
            let created = team::ActiveModel {
                name: Set(org.to_string()),
                is_fund: Set(is_fund),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
            summary.created_teams += 1;
            created.id
        }
    };

    ctx.teams_by_name.insert(key, tid);
    Ok(tid)
}

/// Attach or refresh the investor profile of a fund-level team.
async fn upsert_team_investor_profile(
    txn: &DatabaseTransaction,
    team_id: i32,
    record: &InvestorRecord,
) -> Result<(), RecordError> {
    let now = chrono::Utc::now();
    match investor_profile::Entity::find()
        .filter(investor_profile::Column::TeamId.eq(team_id))
        .one(txn)
        .await?
    {
        Some(profile) => {
            if let Some(ref investment_type) = record.investment_type
                && profile.investment_type.as_deref() != Some(investment_type)
            {
                let mut active: investor_profile::ActiveModel = profile.into();
                active.investment_type = Set(Some(investment_type.clone()));
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
        }
        None => {
            investor_profile::ActiveModel {
                user_id: Set(None),
                team_id: Set(Some(team_id)),
                investment_type: Set(record.investment_type.clone()),
                stages: Set(None),
                sectors: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

async fn upsert_user_investor_profile(
    txn: &DatabaseTransaction,
    user_id: i32,
    record: &InvestorRecord,
) -> Result<(), RecordError> {
    let now = chrono::Utc::now();
    match investor_profile::Entity::find()
        .filter(investor_profile::Column::UserId.eq(user_id))
        .one(txn)
        .await?
    {
        Some(profile) => {
            if let Some(ref investment_type) = record.investment_type
                && profile.investment_type.as_deref() != Some(investment_type)
            {
                let mut active: investor_profile::ActiveModel = profile.into();
                active.investment_type = Set(Some(investment_type.clone()));
                active.updated_at = Set(now);
                active.update(txn).await?;
            }
        }
        None => {
            investor_profile::ActiveModel {
                user_id: Set(Some(user_id)),
                team_id: Set(None),
                investment_type: Set(record.investment_type.clone()),
                stages: Set(None),
                sectors: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(txn)
            .await?;
        }
    }
    Ok(())
}

/// Upsert the identity's membership in the organization's team, promoting to
/// lead from the explicit flag or the first-contact inference.
async fn upsert_membership(
    txn: &DatabaseTransaction,
    team_id: i32,
    user_id: i32,
    record: &InvestorRecord,
    summary: &mut ImportSummary,
) -> Result<(), RecordError> {
    let other_members = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .filter(team_member::Column::UserId.ne(user_id))
        .count(txn)
        .await?;
    let first_contact = other_members == 0;

    let lead = record.is_lead.unwrap_or_else(|| {
        first_contact && !role_vetoes_lead(record.role_title.as_deref())
    });

    let now = chrono::Utc::now();
    match team_member::Entity::find_by_id((team_id, user_id))
        .one(txn)
        .await?
    {
        Some(membership) => {
            let promote = lead && !membership.is_lead;
            let mut active: team_member::ActiveModel = membership.clone().into();
            if promote {
                active.is_lead = Set(true);
            }
            if let Some(ref role_title) = record.role_title
                && membership.role_title.as_deref() != Some(role_title)
            {
                active.role_title = Set(Some(role_title.clone()));
            }
            active.is_investment_team = Set(record.is_fund || membership.is_investment_team);
            active.updated_at = Set(now);
            active.update(txn).await?;
            if promote {
                summary.promoted_to_lead += 1;
            }
        }
        None => {
            team_member::ActiveModel {
                team_id: Set(team_id),
                user_id: Set(user_id),
                is_lead: Set(lead),
                is_main_team: Set(first_contact),
                is_investment_team: Set(record.is_fund),
                role_title: Set(record.role_title.clone()),
                tags: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(txn)
            .await?;
            if lead {
                summary.promoted_to_lead += 1;
            }
        }
    }
    summary.updated_memberships += 1;
    Ok(())
}

fn role_vetoes_lead(role_title: Option<&str>) -> bool {
    let Some(title) = role_title else {
        return false;
    };
    let lower = title.to_lowercase();
    NON_LEAD_ROLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn error_message(e: AppError) -> String {
    match e {
        AppError::Validation(msg) => msg,
        other => format!("{other:?}"),
    }
}
