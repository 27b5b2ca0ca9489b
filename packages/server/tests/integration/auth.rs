use serde_json::json;

use crate::common::{SUPER_ADMIN, SUPER_ADMIN_PASSWORD, TestApp, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn seeded_super_admin_can_log_in() {
        let app = TestApp::spawn().await;

        let res = app.login(SUPER_ADMIN, SUPER_ADMIN_PASSWORD).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["token"].is_string());
        assert_eq!(res.body["user"]["username"], SUPER_ADMIN);
        assert_eq!(res.body["user"]["role"], "admin");
        assert!(res.body["user"].get("password").is_none());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.login(SUPER_ADMIN, "not-the-password").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_error_as_a_wrong_password() {
        let app = TestApp::spawn().await;

        let res = app.login("ghost", "whatever-password").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn blank_username_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::LOGIN, &json!({"username": "  ", "password": "x"}))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod current_user {
    use super::*;

    #[tokio::test]
    async fn me_returns_the_logged_in_profile() {
        let app = TestApp::spawn().await;
        let (id, token) = app
            .create_user_with_role("operator", "operator-pass", "user")
            .await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["username"], "operator");
        assert_eq!(res.body["role"], "user");
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.get_with_token(routes::ME, "not-a-jwt").await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn token_of_a_deleted_user_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let (id, token) = app
            .create_user_with_role("temp", "temporary-pass", "user")
            .await;

        let deleted = app.delete_with_token(&routes::user(id), &admin).await;
        assert_eq!(deleted.status, 204, "{}", deleted.text);

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}

mod signed_downloads {
    use super::*;

    #[tokio::test]
    async fn tampered_download_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token("/api/v1/files/not.a-valid-token")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_INVALID");
    }
}
