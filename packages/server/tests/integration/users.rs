use serde_json::json;

use crate::common::{SUPER_ADMIN, TestApp, routes};

mod management {
    use super::*;

    #[tokio::test]
    async fn admin_creates_a_user_that_can_log_in() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "siti", "displayName": "Siti", "password": "siti-password"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["role"], "user");
        assert_eq!(res.body["displayName"], "Siti");

        let login = app.login("siti", "siti-password").await;
        assert_eq!(login.status, 200);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let body = json!({"username": "siti", "displayName": "Siti", "password": "siti-password"});

        let first = app.post_with_token(routes::USERS, &body, &admin).await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app.post_with_token(routes::USERS, &body, &admin).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "siti", "displayName": "Siti", "password": "short"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn password_change_takes_effect() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (id, _) = app
            .create_user_with_role("budi", "first-password", "user")
            .await;

        let res = app
            .patch_with_token(
                &routes::user(id),
                &json!({"password": "second-password"}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        assert_eq!(app.login("budi", "first-password").await.status, 401);
        assert_eq!(app.login("budi", "second-password").await.status, 200);
    }

    #[tokio::test]
    async fn list_never_exposes_password_hashes() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.get_with_token(routes::USERS, &admin).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let users = res.body.as_array().unwrap();
        assert!(users.iter().any(|u| u["username"] == SUPER_ADMIN));
        assert!(users.iter().all(|u| u.get("password").is_none()));
    }
}

mod protection {
    use super::*;

    async fn super_admin_id(app: &TestApp, token: &str) -> i32 {
        let res = app.get_with_token(routes::ME, token).await;
        res.id()
    }

    #[tokio::test]
    async fn super_admin_cannot_be_edited() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = super_admin_id(&app, &admin).await;

        let res = app
            .patch_with_token(&routes::user(id), &json!({"displayName": "Someone"}), &admin)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn super_admin_cannot_be_deleted_by_another_admin() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let id = super_admin_id(&app, &admin).await;
        let (_, other) = app
            .create_user_with_role("second", "second-admin-pass", "admin")
            .await;

        let res = app.delete_with_token(&routes::user(id), &other).await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn admin_cannot_delete_their_own_account() {
        let app = TestApp::spawn().await;
        let (id, token) = app
            .create_user_with_role("second", "second-admin-pass", "admin")
            .await;

        let res = app.delete_with_token(&routes::user(id), &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn regular_user_cannot_manage_users() {
        let app = TestApp::spawn().await;
        let (_, token) = app
            .create_user_with_role("operator", "operator-pass", "user")
            .await;

        let list = app.get_with_token(routes::USERS, &token).await;
        assert_eq!(list.status, 403);

        let create = app
            .post_with_token(
                routes::USERS,
                &json!({"username": "x", "displayName": "X", "password": "long-enough"}),
                &token,
            )
            .await;
        assert_eq!(create.status, 403);
    }

    #[tokio::test]
    async fn deleting_an_unknown_user_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app.delete_with_token(&routes::user(9999), &admin).await;

        assert_eq!(res.status, 404);
    }
}
