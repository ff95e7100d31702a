use crate::helpers::spawn_app;

#[tokio::test]
async fn unknown_routes_return_a_json_404() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(&format!("{}/api/does-not-exist", &app.address))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(404, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({ "success": false, "message": "Route not found" })
    );
}

async fn preflight(app: &crate::helpers::TestApp, origin: &str) -> reqwest::Response {
    app.api_client
        .request(
            reqwest::Method::OPTIONS,
            &format!("{}/api/contact", &app.address),
        )
        .header("Origin", origin)
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .send()
        .await
        .expect("Failed to execute request.")
}

#[tokio::test]
async fn allowed_origins_pass_the_cors_preflight() {
    let app = spawn_app().await;

    let response = preflight(&app, "http://localhost:5173").await;

    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "http://localhost:5173"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn unknown_origins_are_not_allowed() {
    let app = spawn_app().await;

    let response = preflight(&app, "https://evil.example").await;

    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
}
