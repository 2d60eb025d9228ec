//! SMTP transport backed by lettre

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use uuid::Uuid;

use super::{DeliveryReceipt, MailTransport, OutgoingEmail, TransportError};

/// Connection security for the relay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain connection
    None,
    /// Upgrade with STARTTLS
    #[default]
    Starttls,
    /// TLS from the first byte
    Tls,
}

/// SMTP relay options
#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: TlsMode,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    587
}

fn default_timeout_secs() -> u64 {
    30
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: None,
            password: None,
            tls: TlsMode::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("tls", &self.tls)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Delivers emails through an SMTP relay
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl SmtpTransport {
    /// Build the relay client. No connection is opened until the first send.
    pub fn from_config(config: &SmtpConfig) -> Result<Self, TransportError> {
        let builder = match config.tls {
            TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
            TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| TransportError::Config(format!("STARTTLS relay error: {}", e)))?,
            TlsMode::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| TransportError::Config(format!("TLS relay error: {}", e)))?,
        };

        let builder = builder
            .port(config.port)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));

        let builder = match (&config.username, &config.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            (None, None) => builder,
            _ => {
                return Err(TransportError::Config(
                    "smtp username and password must be set together".to_string(),
                ))
            }
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            tls = ?config.tls,
            "SMTP transport configured"
        );

        Ok(Self {
            inner: builder.build(),
            host: config.host.clone(),
        })
    }

    fn message_id(&self, from: &str) -> String {
        let domain = from
            .rsplit('@')
            .next()
            .map(|d| d.trim_end_matches('>'))
            .filter(|d| !d.is_empty() && *d != from)
            .unwrap_or(self.host.as_str());
        format!("<{}@{}>", Uuid::new_v4(), domain)
    }

    fn build_message(email: &OutgoingEmail, message_id: &str) -> Result<Message, TransportError> {
        let from: Mailbox = email
            .from
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", email.from, e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| TransportError::InvalidAddress(format!("{}: {}", email.to, e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject.clone())
            .message_id(Some(message_id.to_string()))
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))
            .map_err(|e| TransportError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    fn name(&self) -> &'static str {
        "smtp"
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, TransportError> {
        let message_id = self.message_id(&email.from);
        let message = Self::build_message(email, &message_id)?;

        let response = self
            .inner
            .send(message)
            .await
            .map_err(|e| TransportError::Delivery(e.to_string()))?;

        let receipt = DeliveryReceipt::new(message_id, vec![email.to.clone()]);
        Ok(match response.first_line() {
            Some(line) => receipt.with_response(line),
            None => receipt,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email(from: &str, to: &str) -> OutgoingEmail {
        OutgoingEmail {
            from: from.to_string(),
            to: to.to_string(),
            subject: "Test Subject".to_string(),
            html: "<h1>Test</h1>".to_string(),
            text: "Test".to_string(),
        }
    }

    #[test]
    fn test_config_defaults() {
        let config: SmtpConfig =
            serde_json::from_value(serde_json::json!({"host": "smtp.example.com"})).unwrap();
        assert_eq!(config.port, 587);
        assert_eq!(config.tls, TlsMode::Starttls);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_debug_hides_password() {
        let mut config = SmtpConfig::new("smtp.example.com");
        config.username = Some("user".to_string());
        config.password = Some("hunter2".to_string());

        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
    }

    #[test]
    fn test_build_message() {
        let result = SmtpTransport::build_message(
            &email("noreply@example.com", "test@example.com"),
            "<id@example.com>",
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_build_message_rejects_bad_address() {
        let result =
            SmtpTransport::build_message(&email("not an address", "test@example.com"), "<id@x>");
        assert!(matches!(result, Err(TransportError::InvalidAddress(_))));
    }

    #[tokio::test]
    async fn test_credentials_must_be_paired() {
        let mut config = SmtpConfig::new("localhost");
        config.tls = TlsMode::None;
        config.username = Some("user".to_string());

        assert!(matches!(
            SmtpTransport::from_config(&config),
            Err(TransportError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_message_id_uses_sender_domain() {
        let mut config = SmtpConfig::new("localhost");
        config.tls = TlsMode::None;
        let transport = SmtpTransport::from_config(&config).unwrap();

        let id = transport.message_id("Shop <orders@shop.example>");
        assert!(id.ends_with("@shop.example>"));

        let fallback = transport.message_id("no-at-sign");
        assert!(fallback.ends_with("@localhost>"));
    }
}
