use axum::{extract::State, Json};
use serde::Serialize;

use crate::routes::now_rfc3339;
use crate::startup::AppState;

#[derive(Serialize, Debug)]
pub struct HealthReport {
    pub success: bool,
    pub message: &'static str,
    pub timestamp: String,
    pub environment: &'static str,
    #[serde(rename = "gmailConfigured")]
    pub mail_configured: bool,
    pub port: u16,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        success: true,
        message: "Portfolio backend is running",
        timestamp: now_rfc3339(),
        environment: state.environment.as_str(),
        mail_configured: state.mail_configured,
        port: state.port,
    })
}
