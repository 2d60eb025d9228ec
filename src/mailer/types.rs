//! Mailer request, result and error types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::template::TemplateError;
use crate::transport::{DeliveryReceipt, OutgoingEmail, TransportError};

/// Mailer error type
#[derive(Debug, Error)]
pub enum MailerError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("No mail transport configured")]
    MissingTransport,

    #[error("No sender address in arguments, locals or data")]
    MissingSender,

    #[error("No receiver address in arguments, locals or data")]
    MissingReceiver,

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl MailerError {
    /// Short machine-readable reason, used as a metrics label
    pub fn reason(&self) -> &'static str {
        match self {
            MailerError::Template(TemplateError::Unregistered(_)) => "unregistered_template",
            MailerError::Template(TemplateError::Provider { .. }) => "template_provider",
            MailerError::Template(_) => "invalid_template",
            MailerError::MissingTransport => "missing_transport",
            MailerError::MissingSender => "missing_sender",
            MailerError::MissingReceiver => "missing_receiver",
            MailerError::Transport(_) => "transport",
        }
    }
}

/// Result type for mailer operations
pub type MailerResult<T> = Result<T, MailerError>;

/// A send request.
///
/// `receiver` and `sender` accept either an address string or an object with an
/// `email` field. Both are also exposed to templates as `{{receiver}}` and
/// `{{sender}}` (or `{{receiver.name}}` for object values).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendEmailRequest {
    /// Template key
    pub key: String,

    /// Caller-supplied interpolation data
    #[serde(default)]
    pub data: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Value>,

    /// Data injected by adapters; overrides everything else
    #[serde(default, alias = "extraData")]
    pub extra_data: Map<String, Value>,
}

impl SendEmailRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn receiver(mut self, receiver: impl Into<Value>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }

    pub fn sender(mut self, sender: impl Into<Value>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// Set interpolation data. Non-object values are ignored.
    pub fn data(mut self, data: Value) -> Self {
        if let Value::Object(map) = data {
            self.data = map;
        }
        self
    }

    /// Set adapter data. Non-object values are ignored.
    pub fn extra_data(mut self, extra_data: Value) -> Self {
        if let Value::Object(map) = extra_data {
            self.extra_data = map;
        }
        self
    }
}

/// A composed message, before delivery
pub type RenderedMessage = OutgoingEmail;

/// Result of a successful send: the transport receipt plus what was rendered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentEmail {
    #[serde(flatten)]
    pub receipt: DeliveryReceipt,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl SentEmail {
    pub fn new(receipt: DeliveryReceipt, message: RenderedMessage) -> Self {
        Self {
            receipt,
            from: message.from,
            to: message.to,
            subject: message.subject,
            html: message.html,
            text: message.text,
            sent_at: Utc::now(),
        }
    }
}
