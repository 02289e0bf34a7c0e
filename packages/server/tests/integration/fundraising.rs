use serde_json::json;

use crate::common::{TestApp, add_membership, create_team, routes};

/// Admin, event, and an ENABLED founder presenting with a team.
async fn setup_founder_team() -> (TestApp, String, i32, i32, i32) {
    let app = TestApp::spawn().await;
    let (admin, _) = app
        .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
        .await;
    let event_id = app.create_event(&admin, "demo-day").await;

    let (_founder_token, founder_id) = app
        .create_authenticated_user("founder@x.com", "s3cret-pass")
        .await;
    let team_id = create_team(&app.db, "Acme").await;
    add_membership(&app.db, team_id, founder_id, false, true).await;

    let res = app
        .post_with_token(
            &routes::participants(event_id),
            &json!({"user_id": founder_id, "kind": "FOUNDER"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);
    assert_eq!(res.body["status"], "ENABLED");

    (app, admin, event_id, team_id, founder_id)
}

mod publication {
    use super::*;

    #[tokio::test]
    async fn profile_without_materials_stays_draft() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"description": "We make anvils."}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "DRAFT");
    }

    #[tokio::test]
    async fn both_materials_publish_and_detaching_unpublishes() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;
        let one_pager = app.register_upload(&admin, "ONE_PAGER", "deck.pdf").await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({
                    "description": "We make anvils.",
                    "one_pager_upload_id": one_pager,
                    "video_upload_id": video,
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "PUBLISHED");

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"video_upload_id": null}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "DRAFT");
    }

    #[tokio::test]
    async fn publish_cycle_emits_one_event_per_edge() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;
        let one_pager = app.register_upload(&admin, "ONE_PAGER", "deck.pdf").await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        // DRAFT -> PUBLISHED -> DRAFT -> PUBLISHED
        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"one_pager_upload_id": one_pager, "video_upload_id": video}),
                &admin,
            )
            .await;
        assert_eq!(res.body["status"], "PUBLISHED", "{}", res.text);

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"video_upload_id": null}),
                &admin,
            )
            .await;
        assert_eq!(res.body["status"], "DRAFT");

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"video_upload_id": video}),
                &admin,
            )
            .await;
        assert_eq!(res.body["status"], "PUBLISHED");

        let added = app.wait_for_events("team_added_to_listing", 2).await;
        assert_eq!(added.len(), 2, "one event per rising edge");
        let removed = app.settled_events("team_removed_from_listing").await;
        assert_eq!(removed.len(), 1, "one event per falling edge");
    }

    #[tokio::test]
    async fn description_edit_does_not_reemit_edges() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;
        let one_pager = app.register_upload(&admin, "ONE_PAGER", "deck.pdf").await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        app.put_with_token(
            &routes::fundraising_profile(event_id, team_id),
            &json!({"one_pager_upload_id": one_pager, "video_upload_id": video}),
            &admin,
        )
        .await;
        app.put_with_token(
            &routes::fundraising_profile(event_id, team_id),
            &json!({"description": "Still published."}),
            &admin,
        )
        .await;

        let added = app.settled_events("team_added_to_listing").await;
        assert_eq!(added.len(), 1, "a mutation without a crossing emits nothing");
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;
        let one_pager = app.register_upload(&admin, "ONE_PAGER", "deck.pdf").await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        app.put_with_token(
            &routes::fundraising_profile(event_id, team_id),
            &json!({"one_pager_upload_id": one_pager, "video_upload_id": video}),
            &admin,
        )
        .await;

        let first = app
            .post_with_token(
                &routes::fundraising_recompute(event_id, team_id),
                &json!({}),
                &admin,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.body["status"], "PUBLISHED");

        let second = app
            .post_with_token(
                &routes::fundraising_recompute(event_id, team_id),
                &json!({}),
                &admin,
            )
            .await;
        assert_eq!(second.body["status"], "PUBLISHED");

        let added = app.settled_events("team_added_to_listing").await;
        assert_eq!(added.len(), 1, "recompute without change emits nothing");
    }
}

mod upload_references {
    use super::*;

    #[tokio::test]
    async fn kind_mismatch_is_rejected() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"one_pager_upload_id": video}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_upload_is_not_found() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"one_pager_upload_id": "00000000-0000-0000-0000-000000000000"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 404);
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn founder_edits_own_profile_but_not_others() {
        let (app, _admin, event_id, team_id, _founder_id) = setup_founder_team().await;

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "founder@x.com", "password": "s3cret-pass"}),
            )
            .await;
        let founder_token = login.body["token"].as_str().unwrap().to_string();

        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, team_id),
                &json!({"description": "Our own pitch."}),
                &founder_token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let other_team = create_team(&app.db, "Rivals").await;
        let res = app
            .put_with_token(
                &routes::fundraising_profile(event_id, other_team),
                &json!({"description": "Sabotage."}),
                &founder_token,
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

mod participant_edges {
    use super::*;

    #[tokio::test]
    async fn disabling_last_founder_removes_team_from_listing() {
        let (app, admin, event_id, team_id, founder_id) = setup_founder_team().await;
        let one_pager = app.register_upload(&admin, "ONE_PAGER", "deck.pdf").await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        app.put_with_token(
            &routes::fundraising_profile(event_id, team_id),
            &json!({"one_pager_upload_id": one_pager, "video_upload_id": video}),
            &admin,
        )
        .await;
        app.wait_for_events("team_added_to_listing", 1).await;

        let res = app
            .patch_with_token(
                &routes::participant(event_id, founder_id),
                &json!({"status": "DISABLED"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let removed = app.wait_for_events("team_removed_from_listing", 1).await;
        assert_eq!(removed[0].properties["team_id"], team_id);

        let res = app
            .patch_with_token(
                &routes::participant(event_id, founder_id),
                &json!({"status": "ENABLED"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);
        let added = app.wait_for_events("team_added_to_listing", 2).await;
        assert_eq!(added.len(), 2);
    }
}

mod team_updates {
    use super::*;

    #[tokio::test]
    async fn rename_keeps_publication_and_emits_no_edges() {
        let (app, admin, event_id, team_id, _) = setup_founder_team().await;
        let one_pager = app.register_upload(&admin, "ONE_PAGER", "deck.pdf").await;
        let video = app.register_upload(&admin, "VIDEO", "pitch.mp4").await;

        app.put_with_token(
            &routes::fundraising_profile(event_id, team_id),
            &json!({"one_pager_upload_id": one_pager, "video_upload_id": video}),
            &admin,
        )
        .await;

        let res = app
            .patch_with_token(&routes::team(team_id), &json!({"name": "Acme Corp"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Acme Corp");

        let res = app
            .get_with_token(&routes::fundraising_profile(event_id, team_id), &admin)
            .await;
        assert_eq!(res.body["status"], "PUBLISHED");

        let added = app.settled_events("team_added_to_listing").await;
        assert_eq!(added.len(), 1, "rename without a crossing emits nothing");
    }

    #[tokio::test]
    async fn empty_name_is_rejected() {
        let (app, admin, _event_id, team_id, _) = setup_founder_team().await;
        let res = app
            .patch_with_token(&routes::team(team_id), &json!({"name": "   "}), &admin)
            .await;
        assert_eq!(res.status, 400);
    }
}
