use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_title};
use crate::error::AppError;

/// Event lifecycle, in forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventStatus {
    Upcoming,
    RegistrationOpen,
    EarlyAccess,
    Active,
    Completed,
    Archived,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Upcoming => "UPCOMING",
            EventStatus::RegistrationOpen => "REGISTRATION_OPEN",
            EventStatus::EarlyAccess => "EARLY_ACCESS",
            EventStatus::Active => "ACTIVE",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Archived => "ARCHIVED",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "UPCOMING" => Ok(EventStatus::Upcoming),
            "REGISTRATION_OPEN" => Ok(EventStatus::RegistrationOpen),
            "EARLY_ACCESS" => Ok(EventStatus::EarlyAccess),
            "ACTIVE" => Ok(EventStatus::Active),
            "COMPLETED" => Ok(EventStatus::Completed),
            "ARCHIVED" => Ok(EventStatus::Archived),
            other => Err(AppError::Validation(format!(
                "Unknown event status '{other}'"
            ))),
        }
    }

    /// The lifecycle only moves forward; any state may jump to ARCHIVED.
    pub fn can_transition_to(self, next: EventStatus) -> bool {
        next == EventStatus::Archived || next >= self
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    /// Lifecycle transition; forward-only (any state may become ARCHIVED).
    pub status: Option<String>,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub search: Option<String>,
    /// One of: created_at, starts_at, title.
    pub sort_by: Option<String>,
    /// asc or desc.
    pub sort_order: Option<String>,
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct EventListItem {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventListItem>,
    pub pagination: Pagination,
}

impl From<crate::entity::event::Model> for EventResponse {
    fn from(m: crate::entity::event::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            title: m.title,
            description: m.description,
            starts_at: m.starts_at,
            ends_at: m.ends_at,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    let slug = slug.trim();
    let ok = !slug.is_empty()
        && slug.len() <= 64
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !slug.starts_with('-')
        && !slug.ends_with('-');
    if !ok {
        return Err(AppError::Validation(
            "Slug must be 1-64 lowercase alphanumeric/dash characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    validate_slug(&req.slug)?;
    validate_title(&req.title)?;
    if req.ends_at <= req.starts_at {
        return Err(AppError::Validation(
            "ends_at must be after starts_at".into(),
        ));
    }
    Ok(())
}

pub fn validate_update_event(req: &UpdateEventRequest) -> Result<(), AppError> {
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    if let Some(ref status) = req.status {
        EventStatus::parse(status)?;
    }
    if let (Some(start), Some(end)) = (req.starts_at, req.ends_at)
        && end <= start
    {
        return Err(AppError::Validation(
            "ends_at must be after starts_at".into(),
        ));
    }
    Ok(())
}
