use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};

use crate::entity::{event, participant, team};
use crate::error::AppError;

/// Look up a live (non-deleted) event by ID, returning 404 if not found.
pub async fn find_event<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .filter(event::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Same lookup with a row lock, for use inside mutating transactions.
pub async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    use sea_orm::sea_query::LockType;
    use sea_orm::QuerySelect;
    event::Entity::find_by_id(id)
        .filter(event::Column::DeletedAt.is_null())
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up a live participant row for (event, user), returning 404 if absent
/// or soft-deleted.
pub async fn find_participant<C: sea_orm::ConnectionTrait>(
    db: &C,
    event_id: i32,
    user_id: i32,
) -> Result<participant::Model, AppError> {
    participant::Entity::find_by_id((event_id, user_id))
        .filter(participant::Column::DeletedAt.is_null())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Participant not found".into()))
}

pub async fn find_team<C: sea_orm::ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

pub async fn find_team_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<team::Model, AppError> {
    use sea_orm::sea_query::LockType;
    use sea_orm::QuerySelect;
    team::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}
