use reqwest::Method;

use crate::common::{TestApp, routes, work_form};

mod admin_gate {
    use super::*;

    #[tokio::test]
    async fn anonymous_create_is_rejected_before_storage() {
        let app = TestApp::spawn().await;

        let res = app
            .send_form(Method::POST, routes::WORKS, work_form("Zaku II"), None)
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["success"], false);
        assert_eq!(res.body["code"], "UNAUTHORIZED");
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn non_admin_identity_is_rejected() {
        let app = TestApp::spawn().await;
        let token = app.token_for("visitor@example.com");

        let res = app
            .send_form(Method::POST, routes::WORKS, work_form("Zaku II"), Some(&token))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(app.blob_count(), 0);
        assert_eq!(app.get(routes::WORKS).await.body["total"], 0);
    }

    #[tokio::test]
    async fn email_comparison_is_case_sensitive() {
        let app = TestApp::spawn().await;
        let token = app.token_for("Owner@Example.com");

        let res = app
            .send_form(Method::POST, routes::WORKS, work_form("Zaku II"), Some(&token))
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn malformed_token_counts_as_anonymous() {
        let app = TestApp::spawn().await;

        let res = app
            .send_form(
                Method::POST,
                routes::WORKS,
                work_form("Zaku II"),
                Some("not-a-jwt"),
            )
            .await;
        assert_eq!(res.status, 401);
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let app = TestApp::spawn().await;
        let id = app.create_work(work_form("Gouf")).await;

        let token = app.token_for("visitor@example.com");
        let res = app.delete(&routes::work(id), Some(&token)).await;
        assert_eq!(res.status, 401);
        assert_eq!(app.get(&routes::work(id)).await.status, 200);
    }

    #[tokio::test]
    async fn reads_are_public() {
        let app = TestApp::spawn().await;
        assert_eq!(app.get(routes::WORKS).await.status, 200);
        assert_eq!(app.get(routes::TAGS).await.status, 200);
        assert_eq!(app.get(routes::PROJECTS).await.status, 200);
    }
}
