use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/events", event_routes())
        .nest("/teams", team_routes())
        .nest("/uploads", upload_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event,
            handlers::event::delete_event
        ))
        .routes(routes!(handlers::participant::activate))
        .routes(routes!(handlers::participant::apply))
        .routes(routes!(handlers::team_lead::request_team_lead))
        .routes(routes!(handlers::listing::get_profiles_for_viewer))
        .nest("/{id}/participants", participant_routes())
        .nest(
            "/{id}/teams/{team_id}/fundraising-profile",
            profile_routes(),
        )
}

fn participant_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::participant::list_participants,
            handlers::participant::add_participant
        ))
        .routes(routes!(handlers::import::bulk_add_investors))
        .routes(routes!(
            handlers::participant::update_participant,
            handlers::participant::remove_participant
        ))
        .routes(routes!(handlers::team_lead::review_team_lead_request))
}

fn profile_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::fundraising::get_profile,
            handlers::fundraising::upsert_profile
        ))
        .routes(routes!(handlers::fundraising::recompute_profile))
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::fundraising::update_team))
}

fn upload_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::upload::register_upload))
        .routes(routes!(handlers::upload::get_upload))
}
