use sea_orm::prelude::Expr;
use sea_orm::sea_query::ExprTrait;
use sea_orm::sea_query::Func;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use crate::common::{TestApp, routes};
use server::entity::{investor_profile, participant, team, team_member, user};

async fn setup() -> (TestApp, String, i32) {
    let app = TestApp::spawn().await;
    let (admin, _) = app
        .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
        .await;
    let event_id = app.create_event(&admin, "demo-day").await;
    (app, admin, event_id)
}

async fn find_user(app: &TestApp, email: &str) -> user::Model {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("user {email} should exist"))
}

async fn find_team_ci(app: &TestApp, name: &str) -> team::Model {
    team::Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(team::Column::Name))).eq(name.to_lowercase()))
        .one(&app.db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("team {name} should exist"))
}

mod partial_failure {
    use super::*;

    #[tokio::test]
    async fn duplicate_row_errors_while_the_rest_commits() {
        let (app, admin, event_id) = setup().await;

        // Record #2's email already has a participant for this event.
        let res = app
            .post_with_token(
                &routes::participants(event_id),
                &json!({"email": "b@x.com", "name": "B", "kind": "INVESTOR"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201);

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [
                    {"email": "a@x.com", "name": "A", "organization": "Alpha Capital"},
                    {"email": "b@x.com", "name": "B", "organization": "Beta Fund"},
                    {"email": "c@x.com", "name": "C", "organization": "Gamma Ventures"},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let summary = &res.body["summary"];
        assert_eq!(summary["total"], 3);
        assert_eq!(summary["errors"], 1);
        assert_eq!(summary["created_users"], 2);
        assert_eq!(summary["created_teams"], 2);

        let rows = res.body["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["status"], "success");
        assert_eq!(rows[1]["status"], "error");
        assert!(
            rows[1]["message"].as_str().unwrap().contains("already exists"),
            "{}",
            rows[1]["message"]
        );
        assert_eq!(rows[2]["status"], "success");

        // Records #1 and #3 are fully applied in the same commit.
        for (email, org) in [("a@x.com", "Alpha Capital"), ("c@x.com", "Gamma Ventures")] {
            let u = find_user(&app, email).await;
            let t = find_team_ci(&app, org).await;
            let p = participant::Entity::find_by_id((event_id, u.id))
                .one(&app.db)
                .await
                .unwrap()
                .expect("participant should exist");
            assert_eq!(p.kind, "INVESTOR");
            assert_eq!(p.status, "INVITED");
            assert!(
                team_member::Entity::find_by_id((t.id, u.id))
                    .one(&app.db)
                    .await
                    .unwrap()
                    .is_some()
            );
        }
        // The failed record created nothing new.
        assert!(
            team::Entity::find()
                .filter(team::Column::Name.eq("Beta Fund"))
                .one(&app.db)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn malformed_email_is_a_row_error_not_a_request_error() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [
                    {"email": "not-an-email", "name": "X"},
                    {"email": "ok@x.com", "name": "OK"},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["summary"]["errors"], 1);
        assert_eq!(res.body["rows"][0]["status"], "error");
        assert_eq!(res.body["rows"][1]["status"], "success");
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_wholesale() {
        let (app, admin, event_id) = setup().await;
        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": []}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn import_requires_permission() {
        let (app, _admin, event_id) = setup().await;
        let (member, _) = app.create_authenticated_user("m@x.com", "s3cret-pass").await;
        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [{"email": "a@x.com", "name": "A"}]}),
                &member,
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

mod identity_resolution {
    use super::*;

    #[tokio::test]
    async fn handles_are_normalized_before_storage() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [{
                    "email": "a@x.com",
                    "name": "A",
                    "telegram": "@durov",
                    "twitter": "https://twitter.com/jack?ref=import",
                    "linkedin": "https://www.linkedin.com/in/satyanadella/",
                }]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let u = find_user(&app, "a@x.com").await;
        assert_eq!(u.telegram.as_deref(), Some("durov"));
        assert_eq!(u.twitter.as_deref(), Some("jack"));
        assert_eq!(u.linkedin.as_deref(), Some("satyanadella"));
        assert_eq!(u.access_tier, "GUEST");
    }

    #[tokio::test]
    async fn contested_telegram_handle_is_left_unset_silently() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [
                    {"email": "first@x.com", "name": "First", "telegram": "@shared"},
                    {"email": "second@x.com", "name": "Second", "telegram": "https://t.me/shared"},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["summary"]["errors"], 0, "not a row error");

        assert_eq!(
            find_user(&app, "first@x.com").await.telegram.as_deref(),
            Some("shared")
        );
        assert_eq!(find_user(&app, "second@x.com").await.telegram, None);
    }

    #[tokio::test]
    async fn existing_identity_is_merged_and_tier_raised() {
        let (app, admin, event_id) = setup().await;

        // A GUEST identity born through the registry on an earlier event.
        let earlier = app.create_event(&admin, "earlier-day").await;
        let res = app
            .post_with_token(
                &routes::participants(earlier),
                &json!({"email": "known@x.com", "name": "Known", "kind": "INVESTOR"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 201);

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [{
                    "email": "known@x.com",
                    "name": "Known",
                    "telegram": "known_tg",
                }]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["summary"]["updated_users"], 1);
        assert_eq!(res.body["summary"]["created_users"], 0);

        let u = find_user(&app, "known@x.com").await;
        assert_eq!(u.access_tier, "MEMBER", "GUEST is raised to MEMBER");
        assert_eq!(u.telegram.as_deref(), Some("known_tg"));

        // Existing identity joins ENABLED.
        let p = participant::Entity::find_by_id((event_id, u.id))
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(p.status, "ENABLED");
    }
}

mod organizations {
    use super::*;

    #[tokio::test]
    async fn same_org_in_mixed_case_creates_one_team() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [
                    {"email": "gp@x.com", "name": "GP", "organization": "Sequoia", "role_title": "General Partner"},
                    {"email": "assoc@x.com", "name": "Assoc", "organization": "SEQUOIA", "role_title": "Associate"},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["summary"]["created_teams"], 1);

        let t = find_team_ci(&app, "sequoia").await;
        let members = team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(t.id))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(members, 2);

        // First contact becomes lead; the associate does not.
        let gp = find_user(&app, "gp@x.com").await;
        let assoc = find_user(&app, "assoc@x.com").await;
        assert!(
            team_member::Entity::find_by_id((t.id, gp.id))
                .one(&app.db)
                .await
                .unwrap()
                .unwrap()
                .is_lead
        );
        assert!(
            !team_member::Entity::find_by_id((t.id, assoc.id))
                .one(&app.db)
                .await
                .unwrap()
                .unwrap()
                .is_lead
        );
        assert_eq!(res.body["summary"]["promoted_to_lead"], 1);
    }

    #[tokio::test]
    async fn support_role_first_contact_is_not_lead_unless_explicit() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [
                    {"email": "scout@x.com", "name": "Scout", "organization": "Alpha", "role_title": "Venture Scout"},
                    {"email": "boss@x.com", "name": "Boss", "organization": "Beta", "role_title": "Analyst", "is_lead": true},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let alpha = find_team_ci(&app, "alpha").await;
        let scout = find_user(&app, "scout@x.com").await;
        assert!(
            !team_member::Entity::find_by_id((alpha.id, scout.id))
                .one(&app.db)
                .await
                .unwrap()
                .unwrap()
                .is_lead,
            "support role vetoes the inference"
        );

        let beta = find_team_ci(&app, "beta").await;
        let boss = find_user(&app, "boss@x.com").await;
        assert!(
            team_member::Entity::find_by_id((beta.id, boss.id))
                .one(&app.db)
                .await
                .unwrap()
                .unwrap()
                .is_lead,
            "the explicit flag wins over the veto"
        );
    }

    #[tokio::test]
    async fn fund_level_record_attaches_team_investor_profile() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [{
                    "email": "fund@x.com",
                    "name": "Fund Contact",
                    "organization": "Mega Fund",
                    "is_fund": true,
                    "investment_type": "seed",
                }]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let t = find_team_ci(&app, "mega fund").await;
        assert!(t.is_fund);
        let profile = investor_profile::Entity::find()
            .filter(investor_profile::Column::TeamId.eq(t.id))
            .one(&app.db)
            .await
            .unwrap()
            .expect("fund team should carry an investor profile");
        assert_eq!(profile.investment_type.as_deref(), Some("seed"));
    }

    #[tokio::test]
    async fn individual_record_attaches_user_investor_profile() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [{
                    "email": "angel@x.com",
                    "name": "Angel",
                    "investment_type": "angel",
                }]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let u = find_user(&app, "angel@x.com").await;
        let profile = investor_profile::Entity::find()
            .filter(investor_profile::Column::UserId.eq(u.id))
            .one(&app.db)
            .await
            .unwrap()
            .expect("individual investor should carry a profile");
        assert_eq!(profile.investment_type.as_deref(), Some("angel"));
        assert!(profile.team_id.is_none());
    }
}

mod analytics {
    use super::*;

    #[tokio::test]
    async fn participant_added_is_emitted_per_success_after_commit() {
        let (app, admin, event_id) = setup().await;

        let res = app
            .post_with_token(
                &routes::investors_bulk(event_id),
                &json!({"investors": [
                    {"email": "a@x.com", "name": "A"},
                    {"email": "bad-email", "name": "B"},
                    {"email": "c@x.com", "name": "C"},
                ]}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["summary"]["errors"], 1);

        // Two successes, two events; the errored row reports nothing.
        let events = app.wait_for_events("participant_added", 2).await;
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.properties["kind"] == "INVESTOR"));
    }
}
