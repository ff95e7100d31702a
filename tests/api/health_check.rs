use crate::helpers::{spawn_app, spawn_app_with};
use portfolio_backend::configuration::PLACEHOLDER_SENDER;

#[tokio::test]
async fn health_check_works() {
    let app = spawn_app().await;

    let response = app.get_health().await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Portfolio backend is running");
    assert_eq!(body["environment"], "development");
    assert_eq!(body["gmailConfigured"], true);
    assert_eq!(body["port"], app.port);
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn health_check_reports_missing_mail_configuration() {
    let app = spawn_app_with(|c| c.email_client.sender_email = PLACEHOLDER_SENDER.into()).await;

    let body: serde_json::Value = app.get_health().await.json().await.unwrap();

    assert_eq!(body["gmailConfigured"], false);
}

#[tokio::test]
async fn responses_carry_security_headers_and_a_request_id() {
    let app = spawn_app().await;

    let response = app.get_health().await;

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["referrer-policy"], "no-referrer");
    assert!(headers.contains_key("x-request-id"));
}
