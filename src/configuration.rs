use std::time::Duration;

use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::domain::ContactEmail;
use crate::email_client::EmailClient;

/// Sender address shipped in `base.yaml`; mail is not considered configured
/// until it is replaced.
pub const PLACEHOLDER_SENDER: &str = "your-email@example.com";

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub cors: CorsSettings,
    pub rate_limit: RateLimitSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub environment: Environment,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct EmailClientSettings {
    pub base_url: String,
    pub sender_email: String,
    #[serde(default)]
    pub recipient_email: Option<String>,
    pub authorization_token: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub connect_timeout_milliseconds: u64,
    pub dry_run: bool,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<ContactEmail, String> {
        ContactEmail::parse(self.sender_email.clone())
    }

    /// Messages land in the sender's own inbox unless a recipient is set.
    pub fn recipient(&self) -> Result<ContactEmail, String> {
        match &self.recipient_email {
            Some(recipient) => ContactEmail::parse(recipient.clone()),
            None => self.sender(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_milliseconds)
    }

    pub fn is_configured(&self) -> bool {
        let sender = self.sender_email.trim();
        !sender.is_empty()
            && sender != PLACEHOLDER_SENDER
            && !self.authorization_token.expose_secret().is_empty()
    }

    pub fn client(&self) -> Result<EmailClient, anyhow::Error> {
        let sender = self.sender().map_err(|e| anyhow::anyhow!(e))?;
        let recipient = self.recipient().map_err(|e| anyhow::anyhow!(e))?;
        let client = EmailClient::new(
            self.base_url.clone(),
            sender,
            recipient,
            self.authorization_token.clone(),
            self.timeout(),
            self.connect_timeout(),
        )?;
        Ok(client)
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    #[serde(default)]
    pub frontend_url: Option<String>,
}

impl CorsSettings {
    pub fn origins(&self) -> Vec<String> {
        let mut origins = self.allowed_origins.clone();
        if let Some(frontend_url) = &self.frontend_url {
            let frontend_url = frontend_url.trim();
            if !frontend_url.is_empty() && !origins.iter().any(|o| o == frontend_url) {
                origins.push(frontend_url.to_string());
            }
        }
        origins
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct RateLimitSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub window_milliseconds: u64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_requests: u32,
    /// Reverse proxies in front of the service; each appends one
    /// `X-Forwarded-For` entry.
    #[serde(
        default = "default_trusted_proxy_hops",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub trusted_proxy_hops: usize,
}

fn default_trusted_proxy_hops() -> usize {
    1
}

impl RateLimitSettings {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_milliseconds)
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment.
    // Default to `development` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "development".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Add in settings from environment variables (with a prefix of APP and '__' as separator)
        // E.g. `APP_APPLICATION__PORT=5001 would set `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override("application.environment", environment.as_str())?
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(try_from = "String")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Internal error detail is only echoed back to clients outside production.
    pub fn exposes_error_detail(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `development` or `production`.",
                other
            )),
        }
    }
}
