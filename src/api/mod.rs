//! API layer - HTTP endpoint handlers organized by domain.

mod email;
mod health;
mod metrics;
mod routes;
mod template;

// Re-export all handlers for use in server/app.rs
pub use email::send_email;
pub use health::{health, HealthResponse, MailerHealthResponse};
pub use metrics::prometheus_metrics;
pub use routes::api_routes;
pub use template::{register_template, register_templates, RegisteredTemplate, RegisteredTemplates};
