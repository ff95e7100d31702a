use portfolio_backend::configuration::PLACEHOLDER_SENDER;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{spawn_app, spawn_app_with};

#[tokio::test]
async fn test_email_returns_400_when_mail_is_not_configured() {
    let app = spawn_app_with(|c| c.email_client.sender_email = PLACEHOLDER_SENDER.into()).await;

    let response = app.post_test_email().await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_email_verifies_credentials_with_the_mail_api() {
    let app = spawn_app().await;
    Mock::given(path("/server"))
        .and(method("GET"))
        .and(header("X-Postmark-Server-Token", "test-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_test_email().await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Mail configuration is valid");
    assert_eq!(body["sender"], "owner@portfolio.dev");
}

#[tokio::test]
async fn test_email_returns_500_when_credentials_are_rejected() {
    let app = spawn_app().await;
    Mock::given(path("/server"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_test_email().await;

    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "Mail configuration error");
    assert!(body["timestamp"].is_string());
    assert!(body["error"].is_string());
}
