use std::time::Duration;

use portfolio_backend::configuration::Environment;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{spawn_app, spawn_app_with, valid_submission};

#[tokio::test]
async fn contact_returns_200_for_a_valid_submission() {
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "MessageID": "pm-42" })),
        )
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Thank you for your message! I will get back to you soon."
    );
    assert_eq!(body["messageId"], "pm-42");
}

#[tokio::test]
async fn contact_relays_the_submission_to_the_mail_api() {
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let mut submission = valid_submission();
    submission["email"] = "  Jo@Example.COM ".into();
    let response = app.post_contact(&submission).await;
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["messageId"].as_str().unwrap().is_empty());

    let sent = app.sent_emails().await;
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email["ReplyTo"], "jo@example.com");
    assert_eq!(email["To"], "owner@portfolio.dev");
    assert_eq!(email["Subject"], "Portfolio Contact: Hello there");
    assert!(email["TextBody"]
        .as_str()
        .unwrap()
        .contains("This is a test message."));
    assert!(email["HtmlBody"].as_str().unwrap().contains("Jo"));
}

#[tokio::test]
async fn contact_returns_400_listing_every_invalid_field() {
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_contact(&serde_json::json!({
            "name": "J",
            "email": "bad",
            "subject": "Hi",
            "message": "short"
        }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(
        body["errors"],
        serde_json::json!([
            { "field": "name", "message": "Name must be between 2 and 50 characters" },
            { "field": "email", "message": "Please provide a valid email address" },
            { "field": "subject", "message": "Subject must be between 5 and 100 characters" },
            { "field": "message", "message": "Message must be between 10 and 1000 characters" }
        ])
    );
}

#[tokio::test]
async fn contact_returns_400_when_fields_are_missing() {
    let app = spawn_app().await;
    let test_cases = vec![
        (serde_json::json!({}), 4, "everything is missing"),
        (
            serde_json::json!({ "name": "Jo", "email": "jo@example.com" }),
            2,
            "subject and message are missing",
        ),
        (
            serde_json::json!({
                "name": "Jo",
                "email": "jo@example.com",
                "subject": "Hello there"
            }),
            1,
            "message is missing",
        ),
    ];

    for (body, expected_errors, description) in test_cases {
        let response = app.post_contact(&body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when {}.",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body["errors"].as_array().unwrap().len(),
            expected_errors,
            "Unexpected number of field errors when {}.",
            description
        );
    }
}

#[tokio::test]
async fn contact_returns_400_for_a_malformed_body() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .post(&format!("{}/api/contact", &app.address))
        .header("Content-Type", "application/json")
        .body("{\"name\": ")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid request body");
}

#[tokio::test]
async fn contact_returns_500_with_detail_in_development_when_the_mail_api_fails() {
    let app = spawn_app().await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(
        body["message"],
        "Email service is not available. Please try again later."
    );
    assert!(body["error"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn contact_hides_transport_detail_in_production() {
    let app = spawn_app_with(|c| c.application.environment = Environment::Production).await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Email authentication failed. Please contact support."
    );
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn contact_reports_a_timeout_when_the_mail_api_is_too_slow() {
    let app = spawn_app_with(|c| c.email_client.timeout_milliseconds = 200).await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(30)))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(500, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Email service is temporarily unavailable. Please try again later."
    );
}

#[tokio::test]
async fn dry_run_accepts_submissions_without_calling_the_mail_api() {
    let app = spawn_app_with(|c| c.email_client.dry_run = true).await;
    Mock::given(path("/email"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact(&valid_submission()).await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["messageId"].as_str().unwrap().starts_with("dry-run-"));
}
