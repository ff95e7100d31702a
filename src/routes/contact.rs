use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::{ContactSubmission, FieldError};
use crate::relay::{relay, DeliveryOutcome, ErrorCategory};
use crate::routes::{error_chain_fmt, FailureBody};
use crate::startup::AppState;

const THANK_YOU_MESSAGE: &str = "Thank you for your message! I will get back to you soon.";

/// Absent fields deserialize to empty strings so they fail validation like
/// any other bad value.
#[derive(Deserialize, Debug, Default)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl TryFrom<ContactForm> for ContactSubmission {
    type Error = Vec<FieldError>;

    fn try_from(value: ContactForm) -> Result<Self, Self::Error> {
        ContactSubmission::validate(value.name, value.email, value.subject, value.message)
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ContactAccepted {
    pub success: bool,
    pub message: &'static str,
    pub message_id: String,
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Invalid request body")]
    MalformedBody(String),
    #[error("Validation failed")]
    ValidationError(Vec<FieldError>),
    #[error("{}", .category.user_message())]
    DeliveryError {
        category: ErrorCategory,
        detail: Option<String>,
    },
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl IntoResponse for ContactError {
    fn into_response(self) -> Response {
        let mut body = FailureBody::new(self.to_string());
        let status = match self {
            Self::MalformedBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(errors) => {
                body.errors = Some(errors);
                StatusCode::BAD_REQUEST
            }
            Self::DeliveryError { detail, .. } => {
                body.error = detail;
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(body)).into_response()
    }
}

#[tracing::instrument(
    name = "Handling a contact submission",
    skip(state, payload),
    fields(
        name = tracing::field::Empty,
        email = tracing::field::Empty,
    )
)]
pub async fn contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactForm>, JsonRejection>,
) -> Result<Json<ContactAccepted>, ContactError> {
    let Json(form) = payload.map_err(|rejection| {
        tracing::warn!(rejection = %rejection.body_text(), "Rejected an unreadable contact body");
        ContactError::MalformedBody(rejection.body_text())
    })?;
    let submission: ContactSubmission = form.try_into().map_err(ContactError::ValidationError)?;
    tracing::Span::current()
        .record("name", &tracing::field::display(submission.name.as_ref()))
        .record("email", &tracing::field::display(&submission.email));

    match relay(&submission, state.transport.as_ref()).await {
        DeliveryOutcome::Delivered { tracking_id } => Ok(Json(ContactAccepted {
            success: true,
            message: THANK_YOU_MESSAGE,
            message_id: tracking_id,
        })),
        DeliveryOutcome::Failed { category, detail } => Err(ContactError::DeliveryError {
            category,
            detail: state.environment.exposes_error_detail().then_some(detail),
        }),
    }
}
