//! Mail delivery seam.
//!
//! The mailer hands a fully rendered [`OutgoingEmail`] to a [`MailTransport`]
//! and returns whatever [`DeliveryReceipt`] the transport produces. Transport
//! errors are passed back to the caller unchanged; nothing here retries.

mod smtp;
pub mod text;

pub use smtp::{SmtpConfig, SmtpTransport, TlsMode};
pub use text::{HtmlToText, TextConverter, TextOptions};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building or delivering a message
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Invalid transport configuration: {0}")]
    Config(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Acknowledgement returned by a transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Message-ID header of the delivered message
    pub message_id: String,

    /// Recipients accepted by the relay
    pub accepted: Vec<String>,

    /// First line of the relay's final response, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl DeliveryReceipt {
    pub fn new(message_id: impl Into<String>, accepted: Vec<String>) -> Self {
        Self {
            message_id: message_id.into(),
            accepted,
            response: None,
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}

/// Delivery backend for rendered emails
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Transport name for logging
    fn name(&self) -> &'static str {
        "unknown"
    }

    /// Deliver a single email
    async fn send(&self, email: &OutgoingEmail) -> Result<DeliveryReceipt, TransportError>;
}
