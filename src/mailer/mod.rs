//! Template-driven email dispatch.
//!
//! [`Mailer`] owns every piece of process-wide state: options (the cache
//! flag), global locals, the transport handle and the template registry.
//! Construct one per process, or one per test.
//!
//! # Example
//!
//! ```ignore
//! let mailer = Mailer::new();
//! mailer.configure_transport(&SmtpConfig::new("smtp.example.com")).await?;
//!
//! mailer
//!     .register_template(TemplateDefinition::literal("greet", "Hi", "<p>{{name}}</p>"))
//!     .await?;
//!
//! let sent = mailer
//!     .send_email(
//!         SendEmailRequest::new("greet")
//!             .receiver("ada@example.com")
//!             .sender("noreply@example.com")
//!             .data(json!({ "name": "Ada" })),
//!     )
//!     .await?;
//! assert_eq!(sent.html, "<p>Ada</p>");
//! ```

mod context;
mod options;
mod types;

pub use context::{address_of, build_render_context, resolve_address};
pub use options::MailerOptions;
pub use types::{MailerError, MailerResult, RenderedMessage, SendEmailRequest, SentEmail};

use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::metrics::MailMetrics;
use crate::template::{Registration, TemplateDefinition, TemplateRegistry};
use crate::transport::{
    HtmlToText, MailTransport, OutgoingEmail, SmtpConfig, SmtpTransport, TextConverter,
};

/// Registers templates and sends emails rendered from them
pub struct Mailer {
    registry: TemplateRegistry,
    options: RwLock<MailerOptions>,
    locals: RwLock<Arc<Map<String, Value>>>,
    transport: RwLock<Option<Arc<dyn MailTransport>>>,
    text_converter: Arc<dyn TextConverter>,
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailer {
    /// Create a mailer with cache off, no locals and no transport
    pub fn new() -> Self {
        Self::with_text_converter(Arc::new(HtmlToText::default()))
    }

    /// Create a mailer with a custom HTML to plain-text converter
    pub fn with_text_converter(text_converter: Arc<dyn TextConverter>) -> Self {
        Self {
            registry: TemplateRegistry::new(),
            options: RwLock::new(MailerOptions::default()),
            locals: RwLock::new(Arc::new(Map::new())),
            transport: RwLock::new(None),
            text_converter,
        }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Build an SMTP transport and make it the active transport
    pub async fn configure_transport(&self, config: &SmtpConfig) -> MailerResult<()> {
        let transport = SmtpTransport::from_config(config)?;
        self.set_transport(Arc::new(transport)).await;
        Ok(())
    }

    /// Replace the active transport
    pub async fn set_transport(&self, transport: Arc<dyn MailTransport>) {
        tracing::debug!(transport = transport.name(), "Mail transport set");
        *self.transport.write().await = Some(transport);
    }

    pub async fn has_transport(&self) -> bool {
        self.transport.read().await.is_some()
    }

    /// Replace the global locals wholesale
    pub async fn set_global_locals(&self, locals: Map<String, Value>) {
        *self.locals.write().await = Arc::new(locals);
    }

    pub async fn global_locals(&self) -> Arc<Map<String, Value>> {
        self.locals.read().await.clone()
    }

    /// Merge options into the current options
    pub async fn set_options(&self, options: Map<String, Value>) {
        let mut current = self.options.write().await;
        current.merge(options);
        tracing::debug!(cache = current.cache(), "Mailer options updated");
    }

    pub async fn options(&self) -> MailerOptions {
        self.options.read().await.clone()
    }

    pub async fn cache_enabled(&self) -> bool {
        self.options.read().await.cache()
    }

    /// Register a template under the current cache mode
    pub async fn register_template(
        &self,
        definition: TemplateDefinition,
    ) -> MailerResult<Registration> {
        let cache = self.cache_enabled().await;
        Ok(self.registry.register(definition, cache).await?)
    }

    /// Register several templates under the current cache mode.
    ///
    /// Fails as a whole if any single registration fails.
    pub async fn register_templates(
        &self,
        definitions: Vec<TemplateDefinition>,
    ) -> MailerResult<Vec<Registration>> {
        let cache = self.cache_enabled().await;
        Ok(self.registry.register_many(definitions, cache).await?)
    }

    /// Resolve, merge and render a message without sending it
    #[tracing::instrument(name = "mailer.compose", skip(self, request), fields(key = %request.key))]
    pub async fn compose_message(&self, request: &SendEmailRequest) -> MailerResult<RenderedMessage> {
        let cache = self.cache_enabled().await;
        let template = self.registry.resolve(&request.key, cache).await?;

        let locals = self.global_locals().await;
        let context = build_render_context(
            request.receiver.as_ref(),
            request.sender.as_ref(),
            &locals,
            &request.data,
            &request.extra_data,
        );

        let subject = template.render_subject(&context)?;
        let html = template.render_body(&context)?;

        let from = resolve_address(request.sender.as_ref(), &context, "sender")
            .ok_or(MailerError::MissingSender)?;
        let to = resolve_address(request.receiver.as_ref(), &context, "receiver")
            .ok_or(MailerError::MissingReceiver)?;

        let text = self.text_converter.to_plain_text(&html);

        Ok(OutgoingEmail {
            from,
            to,
            subject,
            html,
            text,
        })
    }

    /// Render the template for `request.key` and deliver it
    #[tracing::instrument(name = "mailer.send_email", skip(self, request), fields(key = %request.key))]
    pub async fn send_email(&self, request: SendEmailRequest) -> MailerResult<SentEmail> {
        let started = Instant::now();

        let Some(transport) = self.transport.read().await.clone() else {
            MailMetrics::record_failed(MailerError::MissingTransport.reason());
            return Err(MailerError::MissingTransport);
        };

        let message = self.compose_message(&request).await.inspect_err(|e| {
            MailMetrics::record_failed(e.reason());
        })?;

        let receipt = match transport.send(&message).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::warn!(
                    key = %request.key,
                    to = %message.to,
                    transport = transport.name(),
                    error = %e,
                    "Email delivery failed"
                );
                let err = MailerError::from(e);
                MailMetrics::record_failed(err.reason());
                return Err(err);
            }
        };

        MailMetrics::record_sent(started.elapsed());
        tracing::info!(
            key = %request.key,
            to = %message.to,
            message_id = %receipt.message_id,
            "Email sent"
        );

        Ok(SentEmail::new(receipt, message))
    }
}
