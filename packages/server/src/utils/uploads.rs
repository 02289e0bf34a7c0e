use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::entity::upload;
use crate::error::AppError;
use crate::models::upload::UploadKind;

/// Resolve an upload reference and confirm it is of the expected kind.
/// Unknown references are 404; a kind mismatch (a video where a one-pager
/// belongs) is a validation error.
pub async fn find_upload_of_kind<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: Uuid,
    expected: UploadKind,
) -> Result<upload::Model, AppError> {
    let model = upload::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {id} not found")))?;

    if model.kind != expected.as_str() {
        return Err(AppError::Validation(format!(
            "Upload {id} is {}, expected {}",
            model.kind,
            expected.as_str()
        )));
    }

    Ok(model)
}
