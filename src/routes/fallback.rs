use std::any::Any;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;

use crate::routes::FailureBody;

pub async fn not_found() -> (StatusCode, Json<FailureBody>) {
    (StatusCode::NOT_FOUND, Json(FailureBody::new("Route not found")))
}

/// Turns a panic inside a handler into a generic `500`. The panic message
/// is only echoed when `expose_detail` is set.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>, expose_detail: bool) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };
    tracing::error!(panic.message = %detail, "Request handler panicked");

    let mut body = FailureBody::new("Internal server error");
    if expose_detail {
        body.error = Some(detail);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}
