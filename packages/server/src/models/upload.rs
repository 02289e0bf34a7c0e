use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    OnePager,
    Video,
}

impl UploadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::OnePager => "ONE_PAGER",
            UploadKind::Video => "VIDEO",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "ONE_PAGER" => Ok(UploadKind::OnePager),
            "VIDEO" => Ok(UploadKind::Video),
            other => Err(AppError::Validation(format!(
                "kind must be ONE_PAGER or VIDEO, got '{other}'"
            ))),
        }
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterUploadRequest {
    /// ONE_PAGER or VIDEO.
    pub kind: String,
    pub filename: String,
    pub content_type: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    pub kind: String,
    pub filename: String,
    pub content_type: String,
    pub uploaded_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<crate::entity::upload::Model> for UploadResponse {
    fn from(m: crate::entity::upload::Model) -> Self {
        Self {
            id: m.id,
            kind: m.kind,
            filename: m.filename,
            content_type: m.content_type,
            uploaded_by: m.uploaded_by,
            created_at: m.created_at,
        }
    }
}

pub fn validate_register_upload(req: &RegisterUploadRequest) -> Result<UploadKind, AppError> {
    let kind = UploadKind::parse(&req.kind)?;
    if req.filename.trim().is_empty() || req.filename.len() > 512 {
        return Err(AppError::Validation(
            "filename must be 1-512 characters".into(),
        ));
    }
    if req.content_type.trim().is_empty() || req.content_type.len() > 128 {
        return Err(AppError::Validation(
            "content_type must be 1-128 characters".into(),
        ));
    }
    Ok(kind)
}
