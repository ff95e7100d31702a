use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};

use crate::domain::ContactEmail;

/// Upper bound for a single delivery attempt when a transport does not
/// pick its own.
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

const SERVER_TOKEN_HEADER: &str = "X-Postmark-Server-Token";
const SENDER_DISPLAY_NAME: &str = "Portfolio Contact Form";

/// A fully composed message. Sender and recipient belong to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub reply_to: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("Timed out talking to the mail service: {0}")]
    Timeout(String),
    #[error("The mail service rejected our credentials: {0}")]
    Unauthorized(String),
    #[error("Could not reach the mail service: {0}")]
    Unreachable(String),
    #[error("The mail service answered {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// The capability used to hand a composed message to a mail provider.
#[async_trait::async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError>;

    /// Checks credentials and reachability without sending anything.
    async fn verify(&self) -> Result<(), TransportError>;

    fn operation_timeout(&self) -> Duration {
        DEFAULT_OPERATION_TIMEOUT
    }
}

/// Client for a Postmark-compatible HTTP mail API.
#[derive(Debug)]
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: ContactEmail,
    recipient: ContactEmail,
    authorization_token: Secret<String>,
    timeout: Duration,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: ContactEmail,
        recipient: ContactEmail,
        authorization_token: Secret<String>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            recipient,
            authorization_token,
            timeout,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(TransportError::Unauthorized(format!("{}: {}", status, body)))
            }
            _ => Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            }),
        }
    }
}

#[async_trait::async_trait]
impl MailTransport for EmailClient {
    #[tracing::instrument(name = "Sending email through the mail API", skip(self, email))]
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        let url = format!("{}/email", self.base_url);
        let from = format!("{} <{}>", SENDER_DISPLAY_NAME, self.sender);
        let request_body = SendEmailRequest {
            from: &from,
            to: self.recipient.as_ref(),
            reply_to: &email.reply_to,
            subject: &email.subject,
            html_body: &email.html_body,
            text_body: &email.text_body,
        };
        let response = self
            .http_client
            .post(&url)
            .header(SERVER_TOKEN_HEADER, self.authorization_token.expose_secret())
            .json(&request_body)
            .send()
            .await
            .map_err(transport_error)?;
        let response = Self::check_status(response).await?;

        // A missing or unreadable body still means the message was accepted.
        let message_id = response
            .json::<SendEmailResponse>()
            .await
            .ok()
            .and_then(|r| r.message_id)
            .filter(|id| !id.is_empty());
        Ok(DeliveryReceipt { message_id })
    }

    #[tracing::instrument(name = "Verifying mail API credentials", skip(self))]
    async fn verify(&self) -> Result<(), TransportError> {
        let url = format!("{}/server", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header(SERVER_TOKEN_HEADER, self.authorization_token.expose_secret())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(transport_error)?;
        Self::check_status(response).await?;
        Ok(())
    }

    fn operation_timeout(&self) -> Duration {
        self.timeout
    }
}

fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_connect() {
        TransportError::Unreachable(error.to_string())
    } else {
        TransportError::Unexpected(anyhow::Error::new(error))
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    reply_to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

#[derive(serde::Deserialize)]
struct SendEmailResponse {
    #[serde(rename = "MessageID")]
    message_id: Option<String>,
}

/// Accepts every message without sending it anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunTransport;

#[async_trait::async_trait]
impl MailTransport for DryRunTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<DeliveryReceipt, TransportError> {
        tracing::info!(
            reply_to = %email.reply_to,
            subject = %email.subject,
            "Dry run enabled, skipping email delivery"
        );
        Ok(DeliveryReceipt {
            message_id: Some(format!("dry-run-{}", uuid::Uuid::new_v4())),
        })
    }

    async fn verify(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
