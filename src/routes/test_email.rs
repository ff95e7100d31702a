use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;

use crate::routes::{error_chain_fmt, now_rfc3339, FailureBody};
use crate::startup::AppState;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MailConfigurationReport {
    pub success: bool,
    pub message: &'static str,
    pub sender: String,
    pub dry_run: bool,
    pub timestamp: String,
}

#[derive(thiserror::Error)]
pub enum TestEmailError {
    #[error(
        "Mail is not configured. Set APP_EMAIL_CLIENT__SENDER_EMAIL and \
        APP_EMAIL_CLIENT__AUTHORIZATION_TOKEN."
    )]
    NotConfigured,
    #[error("Mail configuration error")]
    VerificationFailed { detail: Option<String> },
}

impl std::fmt::Debug for TestEmailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for TestEmailError {
    fn into_response(self) -> Response {
        let mut body = FailureBody::new(self.to_string());
        let status = match self {
            Self::NotConfigured => StatusCode::BAD_REQUEST,
            Self::VerificationFailed { detail } => {
                body.error = detail;
                body.timestamp = Some(now_rfc3339());
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Checks that the mail credentials are accepted without sending anything.
#[tracing::instrument(name = "Verifying the mail configuration", skip(state))]
pub async fn test_email(
    State(state): State<AppState>,
) -> Result<Json<MailConfigurationReport>, TestEmailError> {
    if !state.mail_configured {
        return Err(TestEmailError::NotConfigured);
    }
    let verification =
        tokio::time::timeout(state.transport.operation_timeout(), state.transport.verify()).await;
    let detail = match verification {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(_) => Some("Connection timeout while verifying the mail service".to_string()),
    };
    if let Some(detail) = detail {
        tracing::error!(error.message = %detail, "Mail configuration check failed");
        return Err(TestEmailError::VerificationFailed {
            detail: state.environment.exposes_error_detail().then_some(detail),
        });
    }
    Ok(Json(MailConfigurationReport {
        success: true,
        message: "Mail configuration is valid",
        sender: state.sender.clone(),
        dry_run: state.dry_run,
        timestamp: now_rfc3339(),
    }))
}
