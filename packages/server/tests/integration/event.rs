use serde_json::json;

use crate::common::{TestApp, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn admin_creates_event_in_upcoming_state() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;

        let id = app.create_event(&admin, "demo-day-2099").await;
        let res = app.get_with_token(&routes::event(id), &admin).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["slug"], "demo-day-2099");
        assert_eq!(res.body["status"], "UPCOMING");
    }

    #[tokio::test]
    async fn duplicate_slug_is_conflict() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;

        app.create_event(&admin, "demo-day").await;
        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({
                    "slug": "demo-day",
                    "title": "Another",
                    "description": "x",
                    "starts_at": "2099-01-01T00:00:00Z",
                    "ends_at": "2099-01-02T00:00:00Z",
                }),
                &admin,
            )
            .await;
        assert_eq!(res.status, 409);
    }

    #[tokio::test]
    async fn members_cannot_create_events() {
        let app = TestApp::spawn().await;
        let (member, _) = app
            .create_authenticated_user("m@example.com", "s3cret-pass")
            .await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({
                    "slug": "nope",
                    "title": "Nope",
                    "description": "x",
                    "starts_at": "2099-01-01T00:00:00Z",
                    "ends_at": "2099-01-02T00:00:00Z",
                }),
                &member,
            )
            .await;
        assert_eq!(res.status, 403);
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn status_moves_forward_only() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;
        let id = app.create_event(&admin, "demo-day").await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"status": "ACTIVE"}), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["status"], "ACTIVE");

        // Backwards is rejected.
        let res = app
            .patch_with_token(&routes::event(id), &json!({"status": "UPCOMING"}), &admin)
            .await;
        assert_eq!(res.status, 400);

        // Archiving is always allowed.
        let res = app
            .patch_with_token(&routes::event(id), &json!({"status": "ARCHIVED"}), &admin)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "ARCHIVED");
    }

    #[tokio::test]
    async fn soft_deleted_event_is_gone_from_the_api() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;
        let id = app.create_event(&admin, "demo-day").await;

        let res = app.delete_with_token(&routes::event(id), &admin).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::event(id), &admin).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn empty_patch_returns_event_unchanged() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;
        let id = app.create_event(&admin, "demo-day").await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({}), &admin)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "UPCOMING");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn list_is_paginated_and_searchable() {
        let app = TestApp::spawn().await;
        let (admin, _) = app
            .create_user_with_role("admin@example.com", "s3cret-pass", "admin")
            .await;

        app.create_event(&admin, "spring-demo-day").await;
        app.create_event(&admin, "autumn-demo-day").await;

        let res = app
            .get_with_token(&format!("{}?per_page=1", routes::EVENTS), &admin)
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["pagination"]["total"], 2);
        assert_eq!(res.body["pagination"]["total_pages"], 2);

        let res = app
            .get_with_token(&format!("{}?search=spring", routes::EVENTS), &admin)
            .await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["data"][0]["slug"], "spring-demo-day");
    }
}
