use sea_orm::EntityTrait;
use serde_json::json;

use crate::common::{TestApp, add_membership, create_team, routes};
use server::entity::team_member;

/// Admin + event + a founder (with credentials and token) on a team,
/// not yet lead.
async fn setup() -> (TestApp, String, String, i32, i32, i32) {
    let app = TestApp::spawn().await;
    let (admin, _) = app
        .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
        .await;
    let event_id = app.create_event(&admin, "demo-day").await;

    let (founder_token, founder_id) = app
        .create_authenticated_user("founder@x.com", "s3cret-pass")
        .await;
    let team_id = create_team(&app.db, "Acme").await;
    add_membership(&app.db, team_id, founder_id, false, true).await;

    // Attach as founder without the lead side effect of addParticipant: add
    // by reference, then strip the flag the registry set.
    let res = app
        .post_with_token(
            &routes::participants(event_id),
            &json!({"user_id": founder_id, "kind": "FOUNDER"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let membership = team_member::Entity::find_by_id((team_id, founder_id))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: team_member::ActiveModel = membership.into();
    active.is_lead = sea_orm::Set(false);
    team_member::Entity::update(active)
        .exec(&app.db)
        .await
        .unwrap();

    (app, admin, founder_token, event_id, team_id, founder_id)
}

mod requesting {
    use super::*;

    #[tokio::test]
    async fn founder_with_team_can_request_once() {
        let (app, _admin, founder, event_id, team_id, founder_id) = setup().await;

        let res = app
            .post_with_token(&routes::team_lead_request(event_id), &json!({}), &founder)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["lead_request_status"], "REQUESTED");
        assert_eq!(res.body["team_id"].as_i64().unwrap() as i32, team_id);
        assert_eq!(res.body["user_id"].as_i64().unwrap() as i32, founder_id);

        // No re-request while one is pending.
        let res = app
            .post_with_token(&routes::team_lead_request(event_id), &json!({}), &founder)
            .await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn non_founder_cannot_request() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;
        let event_id = app.create_event(&admin, "demo-day").await;

        let (investor_token, investor_id) = app
            .create_authenticated_user("inv@x.com", "s3cret-pass")
            .await;
        let res = app
            .post_with_token(
                &routes::participants(event_id),
                &json!({"user_id": investor_id, "kind": "INVESTOR"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201);

        let res = app
            .post_with_token(&routes::team_lead_request(event_id), &json!({}), &investor_token)
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn founder_without_team_is_denied() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;
        let event_id = app.create_event(&admin, "demo-day").await;

        // No memberships at all, so the founder lands without a team.
        let res = app
            .post_with_token(
                &routes::participants(event_id),
                &json!({"email": "teamless@x.com", "name": "T", "kind": "FOUNDER"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201);
        let uid = res.body["user_id"].as_i64().unwrap() as i32;

        let hash = server::utils::hash::hash_password("s3cret-pass").unwrap();
        let identity = server::entity::user::Entity::find_by_id(uid)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: server::entity::user::ActiveModel = identity.into();
        active.password_hash = sea_orm::Set(Some(hash));
        server::entity::user::Entity::update(active)
            .exec(&app.db)
            .await
            .unwrap();
        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "teamless@x.com", "password": "s3cret-pass"}),
            )
            .await;
        let token = login.body["token"].as_str().unwrap().to_string();

        let res = app
            .post_with_token(&routes::team_lead_request(event_id), &json!({}), &token)
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn existing_lead_cannot_request() {
        let (app, _admin, founder, event_id, team_id, founder_id) = setup().await;

        let membership = team_member::Entity::find_by_id((team_id, founder_id))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        let mut active: team_member::ActiveModel = membership.into();
        active.is_lead = sea_orm::Set(true);
        team_member::Entity::update(active)
            .exec(&app.db)
            .await
            .unwrap();

        let res = app
            .post_with_token(&routes::team_lead_request(event_id), &json!({}), &founder)
            .await;
        assert_eq!(res.status, 400);
    }
}

mod reviewing {
    use super::*;

    #[tokio::test]
    async fn approval_applies_both_writes() {
        let (app, admin, founder, event_id, team_id, founder_id) = setup().await;

        app.post_with_token(&routes::team_lead_request(event_id), &json!({}), &founder)
            .await;

        let res = app
            .post_with_token(
                &routes::team_lead_review(event_id, founder_id),
                &json!({"approve": true}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["lead_request_status"], "APPROVED");

        // Both halves of the atomic unit landed.
        let membership = team_member::Entity::find_by_id((team_id, founder_id))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(membership.is_lead);
    }

    #[tokio::test]
    async fn rejection_flips_only_the_request() {
        let (app, admin, founder, event_id, team_id, founder_id) = setup().await;

        app.post_with_token(&routes::team_lead_request(event_id), &json!({}), &founder)
            .await;

        let res = app
            .post_with_token(
                &routes::team_lead_review(event_id, founder_id),
                &json!({"approve": false}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["lead_request_status"], "REJECTED");

        let membership = team_member::Entity::find_by_id((team_id, founder_id))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(!membership.is_lead);
    }

    #[tokio::test]
    async fn review_without_pending_request_is_conflict() {
        let (app, admin, _founder, event_id, _team_id, founder_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::team_lead_review(event_id, founder_id),
                &json!({"approve": true}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);

        // And a decided request cannot be decided twice.
        let (founder, event2, founder2) = setup_second(&app).await;
        app.post_with_token(&routes::team_lead_request(event2), &json!({}), &founder)
            .await;
        app.post_with_token(
            &routes::team_lead_review(event2, founder2),
            &json!({"approve": true}),
            &admin,
        )
        .await;
        let res = app
            .post_with_token(
                &routes::team_lead_review(event2, founder2),
                &json!({"approve": false}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn members_cannot_review() {
        let (app, _admin, founder, event_id, _team_id, founder_id) = setup().await;

        app.post_with_token(&routes::team_lead_request(event_id), &json!({}), &founder)
            .await;

        let res = app
            .post_with_token(
                &routes::team_lead_review(event_id, founder_id),
                &json!({"approve": true}),
                &founder,
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

/// A second founder/event pair inside an existing app, for tests needing two
/// independent requests. Returns (founder token, event id, founder id).
async fn setup_second(app: &TestApp) -> (String, i32, i32) {
    let admin_login = app
        .post_without_token(
            routes::LOGIN,
            &json!({"email": "admin@example.com", "password": "s3cret-pass"}),
        )
        .await;
    let admin = admin_login.body["token"].as_str().unwrap().to_string();
    let event_id = app.create_event(&admin, "demo-day-two").await;

    let (founder_token, founder_id) = app
        .create_authenticated_user("founder2@x.com", "s3cret-pass")
        .await;
    let team_id = create_team(&app.db, "Globex").await;
    add_membership(&app.db, team_id, founder_id, false, true).await;

    let res = app
        .post_with_token(
            &routes::participants(event_id),
            &json!({"user_id": founder_id, "kind": "FOUNDER"}),
            &admin,
        )
        .await;
    assert_eq!(res.status, 201, "{}", res.text);

    let membership = team_member::Entity::find_by_id((team_id, founder_id))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    let mut active: team_member::ActiveModel = membership.into();
    active.is_lead = sea_orm::Set(false);
    team_member::Entity::update(active)
        .exec(&app.db)
        .await
        .unwrap();

    (founder_token, event_id, founder_id)
}
