use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::upload;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::upload::{RegisterUploadRequest, UploadResponse, validate_register_upload};
use crate::state::AppState;

/// Register an upload reference. The bytes live in the external storage
/// service; fundraising profiles attach these references.
#[utoipa::path(
    post,
    path = "/",
    tag = "Uploads",
    operation_id = "registerUpload",
    summary = "Register an upload reference",
    request_body = RegisterUploadRequest,
    responses(
        (status = 201, description = "Upload registered", body = UploadResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn register_upload(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterUploadRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = validate_register_upload(&payload)?;

    let model = upload::ActiveModel {
        id: Set(Uuid::now_v7()),
        kind: Set(kind.as_str().to_string()),
        filename: Set(payload.filename.trim().to_string()),
        content_type: Set(payload.content_type.trim().to_string()),
        uploaded_by: Set(auth_user.user_id),
        created_at: Set(chrono::Utc::now()),
    }
    .insert(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(UploadResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Uploads",
    operation_id = "getUpload",
    summary = "Get an upload reference",
    params(("id" = Uuid, Path, description = "Upload ID")),
    responses(
        (status = 200, description = "Upload reference", body = UploadResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Upload not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id = %id))]
pub async fn get_upload(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UploadResponse>, AppError> {
    let model = upload::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Upload not found".into()))?;
    Ok(Json(model.into()))
}
