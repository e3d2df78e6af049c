use serde_json::json;

use crate::common::{TestApp, routes};

mod registration {
    use super::*;

    #[tokio::test]
    async fn new_user_can_register_with_valid_credentials() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@example.com", "password": "testpass123", "name": "Test"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["email"], "test@example.com");
        assert_eq!(res.body["name"], "Test");
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn email_domain_is_normalized() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "Test@EXAMPLE.com", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "Test@example.com");
    }

    #[tokio::test]
    async fn cannot_register_the_same_email_twice() {
        let app = TestApp::spawn().await;
        let body = json!({"email": "test@example.com", "password": "testpass123"});

        let first = app.post_without_token(routes::CREATE_USER, &body).await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.post_without_token(routes::CREATE_USER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn cannot_register_with_a_short_password() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "test@example.com", "password": "pw"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(res.body["field"], "password");
    }

    #[tokio::test]
    async fn cannot_register_with_a_malformed_email() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::CREATE_USER,
                &json!({"email": "not-an-email", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["field"], "email");
    }
}

mod token {
    use super::*;

    #[tokio::test]
    async fn registered_user_receives_a_token() {
        let app = TestApp::spawn().await;

        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;
        app.create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": "wrongpass"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
        assert!(res.body.get("token").is_none());
    }

    #[tokio::test]
    async fn unknown_email_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "nobody@example.com", "password": "testpass123"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn blank_password_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": ""}),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod profile {
    use super::*;

    #[tokio::test]
    async fn me_requires_a_token() {
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
    async fn me_returns_the_callers_profile() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app.get_with_token(routes::ME, &token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["email"], "test@example.com");
        assert_eq!(res.body["name"], "Test User");
    }

    #[tokio::test]
    async fn changed_password_is_used_for_new_tokens() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("test@example.com", "testpass123")
            .await;

        let res = app
            .patch_with_token(
                routes::ME,
                &json!({"name": "Renamed", "password": "newpass123"}),
                &token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["name"], "Renamed");

        let old = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": "testpass123"}),
            )
            .await;
        assert_eq!(old.status, 401);

        let new = app
            .post_without_token(
                routes::TOKEN,
                &json!({"email": "test@example.com", "password": "newpass123"}),
            )
            .await;
        assert_eq!(new.status, 200);
    }
}
