//! Delivery of validated contact submissions.
//!
//! A submission gets exactly one delivery attempt. Transport failures never
//! escape as errors: they are classified into an [`ErrorCategory`] and
//! returned inside a [`DeliveryOutcome`] for the caller to surface.

use chrono::{DateTime, Utc};

use crate::domain::ContactSubmission;
use crate::email_client::{MailTransport, OutboundEmail, TransportError};

pub const SUBJECT_PREFIX: &str = "Portfolio Contact: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ConnectionTimeout,
    AuthenticationFailure,
    ServiceUnavailable,
    Unknown,
}

impl ErrorCategory {
    /// The message shown to the submitter for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::ConnectionTimeout => {
                "Email service is temporarily unavailable. Please try again later."
            }
            Self::AuthenticationFailure => "Email authentication failed. Please contact support.",
            Self::ServiceUnavailable => "Email service is not available. Please try again later.",
            Self::Unknown => {
                "Sorry, there was an error sending your message. Please try again later."
            }
        }
    }

    pub fn classify(error: &TransportError) -> Self {
        match error {
            TransportError::Timeout(_) => Self::ConnectionTimeout,
            TransportError::Unauthorized(_) => Self::AuthenticationFailure,
            TransportError::Unreachable(_) => Self::ServiceUnavailable,
            TransportError::Rejected { status, .. } if *status >= 500 => Self::ServiceUnavailable,
            TransportError::Rejected { .. } | TransportError::Unexpected(_) => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ConnectionTimeout => "connection_timeout",
            Self::AuthenticationFailure => "authentication_failure",
            Self::ServiceUnavailable => "service_unavailable",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { tracking_id: String },
    Failed { category: ErrorCategory, detail: String },
}

#[tracing::instrument(
    name = "Relaying a contact submission",
    skip(submission, transport),
    fields(
        reply_to = %submission.email,
        tracking_id = tracing::field::Empty,
    )
)]
pub async fn relay(submission: &ContactSubmission, transport: &dyn MailTransport) -> DeliveryOutcome {
    let email = compose_email(submission, Utc::now());
    let timeout = transport.operation_timeout();

    let result = match tokio::time::timeout(timeout, transport.send(&email)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(format!(
            "no answer from the mail service within {}ms",
            timeout.as_millis()
        ))),
    };

    match result {
        Ok(receipt) => {
            let tracking_id = receipt
                .message_id
                .unwrap_or_else(|| format!("msg-{}", uuid::Uuid::new_v4()));
            tracing::Span::current().record("tracking_id", &tracing::field::display(&tracking_id));
            tracing::info!("Contact submission delivered");
            DeliveryOutcome::Delivered { tracking_id }
        }
        Err(error) => {
            let category = ErrorCategory::classify(&error);
            tracing::error!(
                error.cause_chain = ?error,
                error.message = %error,
                %category,
                "Failed to deliver a contact submission"
            );
            DeliveryOutcome::Failed {
                category,
                detail: error.to_string(),
            }
        }
    }
}

pub fn compose_email(submission: &ContactSubmission, sent_at: DateTime<Utc>) -> OutboundEmail {
    let name = submission.name.as_ref();
    let email = submission.email.as_ref();
    let subject = submission.subject.as_ref();
    let message = submission.message.as_ref();
    let sent_at = sent_at.format("%Y-%m-%d %H:%M:%S UTC");

    let text_body = format!(
        "New Contact Form Submission\n\
        \n\
        Name: {name}\n\
        Email: {email}\n\
        Subject: {subject}\n\
        \n\
        Message:\n\
        {message}\n\
        \n\
        Sent at: {sent_at}\n"
    );

    let name = htmlescape::encode_minimal(name);
    let email_attribute = htmlescape::encode_attribute(email);
    let email = htmlescape::encode_minimal(email);
    let subject = htmlescape::encode_minimal(subject);
    let message = htmlescape::encode_minimal(message);
    let html_body = format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h1 style="font-size: 24px;">New Contact Form Submission</h1>
  <h3>Contact Details</h3>
  <p><strong>Name:</strong> {name}</p>
  <p><strong>Email:</strong> <a href="mailto:{email_attribute}">{email}</a></p>
  <p><strong>Subject:</strong> {subject}</p>
  <h3>Message</h3>
  <p style="white-space: pre-wrap;">{message}</p>
  <p style="color: #999; font-size: 14px;">This message was sent from your portfolio contact form at {sent_at}</p>
</div>"#
    );

    OutboundEmail {
        reply_to: submission.email.as_ref().to_string(),
        subject: format!("{}{}", SUBJECT_PREFIX, submission.subject.as_ref()),
        html_body,
        text_body,
    }
}
