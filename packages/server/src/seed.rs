use sea_orm::*;
use sea_query::{Index, PostgresQueryBuilder};
use tracing::info;

use crate::entity::{fundraising_profile, participant, role, role_permission};

/// Default roles seeded on startup.
const DEFAULT_ROLES: &[&str] = &["admin", "organizer", "member"];

/// Default role-permission mappings seeded on startup.
const DEFAULT_MAPPINGS: &[(&str, &str)] = &[
    // Admin: all permissions
    ("admin", "event:manage"),
    ("admin", "participant:manage"),
    ("admin", "investor:import"),
    ("admin", "fundraising:manage"),
    ("admin", "teamlead:review"),
    // Organizer: runs the event day to day, no event lifecycle control
    ("organizer", "participant:manage"),
    ("organizer", "investor:import"),
    ("organizer", "fundraising:manage"),
    ("organizer", "teamlead:review"),
    // Member: self-service endpoints only
];

/// Seed the `role` and `role_permission` tables with defaults.
pub async fn seed_role_permissions(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Seed roles
    let mut roles_inserted = 0u32;
    for &name in DEFAULT_ROLES {
        let model = role::ActiveModel {
            name: Set(name.to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(role::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => roles_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if roles_inserted > 0 {
        info!("Seeded {} new roles", roles_inserted);
    }

    // Seed role-permission mappings
    let mut perms_inserted = 0u32;
    for &(role, permission) in DEFAULT_MAPPINGS {
        let model = role_permission::ActiveModel {
            role: Set(role.to_string()),
            permission: Set(permission.to_string()),
        };

        let result = role_permission::Entity::insert(model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    role_permission::Column::Role,
                    role_permission::Column::Permission,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => perms_inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if perms_inserted > 0 {
        info!("Seeded {} new role-permission mappings", perms_inserted);
    }

    Ok(())
}

/// Ensure required database indexes exist.
///
/// SeaORM's schema-sync doesn't support composite non-unique indexes,
/// so we create them manually on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Composite index for the listing-eligibility probe:
    // SELECT COUNT(*) FROM participant
    //   WHERE event_id = ? AND team_id = ? AND kind = ? AND status = ?
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_participant_event_team_kind_status")
        .table(participant::Entity)
        .col(participant::Column::EventId)
        .col(participant::Column::TeamId)
        .col(participant::Column::Kind)
        .col(participant::Column::Status)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_participant_event_team_kind_status exists");
        }
        Err(e) => {
            tracing::warn!(
                "Failed to create index idx_participant_event_team_kind_status: {}",
                e
            );
        }
    }

    // Index the per-event published set backing the viewer listing.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_fundraising_profile_event_status")
        .table(fundraising_profile::Entity)
        .col(fundraising_profile::Column::EventId)
        .col(fundraising_profile::Column::Status)
        .to_string(PostgresQueryBuilder);

    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index idx_fundraising_profile_event_status exists");
        }
        Err(e) => {
            tracing::warn!(
                "Failed to create index idx_fundraising_profile_event_status: {}",
                e
            );
        }
    }

    Ok(())
}
