// Supporting modules
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Mailing core
pub mod mailer;
pub mod template;
pub mod transport;

// HTTP layer
pub mod api;
pub mod binding;
pub mod server;

pub use binding::{attach_mailer, bind_request_handler, MailerBinding, RequestMailer};
pub use mailer::{Mailer, MailerError, MailerResult, SendEmailRequest, SentEmail};
pub use template::{TemplateContent, TemplateDefinition, TemplateError, TemplateProvider};
pub use transport::{MailTransport, SmtpConfig, TransportError};
