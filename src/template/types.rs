//! Template types and error definitions

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::renderer::CompiledTemplate;

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not registered: {0}")]
    Unregistered(String),

    #[error("Invalid template key: key must not be empty")]
    InvalidKey,

    #[error("Template {0} has no body, body_path or provider")]
    InvalidSource(String),

    #[error("Template provider failed for {key}: {message}")]
    Provider { key: String, message: String },

    #[error("Template {key} does not compile: {message}")]
    Syntax { key: String, message: String },

    #[error("Template {key} failed to render: {message}")]
    Render { key: String, message: String },

    #[error("Template path {path} rejected: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Concrete subject and body text of a template, before compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateContent {
    pub subject: String,
    pub body: String,
}

impl TemplateContent {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Async source of template content, invoked every time the template is compiled.
///
/// Closures returning a future implement this trait, so a provider backed by an
/// external store can be written inline:
///
/// ```ignore
/// let store = store.clone();
/// TemplateDefinition::dynamic("digest", move || {
///     let store = store.clone();
///     async move { store.fetch("digest").await }
/// });
/// ```
#[async_trait]
pub trait TemplateProvider: Send + Sync {
    async fn provide(&self) -> anyhow::Result<TemplateContent>;
}

#[async_trait]
impl<F, Fut> TemplateProvider for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<TemplateContent>> + Send + 'static,
{
    async fn provide(&self) -> anyhow::Result<TemplateContent> {
        (self)().await
    }
}

/// Where a template's text comes from
#[derive(Clone)]
pub enum TemplateSource {
    /// Subject and body given inline
    Literal { subject: String, body: String },

    /// Inline subject, body read from a file at compile time
    Path { subject: String, path: PathBuf },

    /// Subject and body fetched from a provider at compile time
    Dynamic(Arc<dyn TemplateProvider>),
}

impl TemplateSource {
    pub fn kind(&self) -> &'static str {
        match self {
            TemplateSource::Literal { .. } => "literal",
            TemplateSource::Path { .. } => "path",
            TemplateSource::Dynamic(_) => "dynamic",
        }
    }
}

impl fmt::Debug for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSource::Literal { subject, body } => f
                .debug_struct("Literal")
                .field("subject", subject)
                .field("body", body)
                .finish(),
            TemplateSource::Path { subject, path } => f
                .debug_struct("Path")
                .field("subject", subject)
                .field("path", path)
                .finish(),
            TemplateSource::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// A registration request as received from callers, config files or HTTP.
///
/// Fields are optional here; [`TemplateDefinition::into_source`] picks exactly
/// one source. When several are set the provider wins, then the inline body,
/// then the body path.
#[derive(Clone, Default, Deserialize)]
pub struct TemplateDefinition {
    /// Unique template key
    pub key: String,

    /// Subject template (ignored for provider-backed templates)
    #[serde(default)]
    pub subject: String,

    /// Inline HTML body template
    #[serde(default, alias = "bodyTemplate")]
    pub body: Option<String>,

    /// Path of a file holding the HTML body template
    #[serde(default, alias = "bodyTemplatePath")]
    pub body_path: Option<PathBuf>,

    /// Provider resolving subject and body at compile time
    #[serde(skip)]
    pub provider: Option<Arc<dyn TemplateProvider>>,
}

impl TemplateDefinition {
    pub fn literal(
        key: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            subject: subject.into(),
            body: Some(body.into()),
            ..Default::default()
        }
    }

    pub fn from_path(
        key: impl Into<String>,
        subject: impl Into<String>,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            key: key.into(),
            subject: subject.into(),
            body_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn dynamic(key: impl Into<String>, provider: impl TemplateProvider + 'static) -> Self {
        Self {
            key: key.into(),
            provider: Some(Arc::new(provider)),
            ..Default::default()
        }
    }

    /// Validate the key and select the template source.
    pub fn into_source(self) -> TemplateResult<(String, TemplateSource)> {
        if self.key.trim().is_empty() {
            return Err(TemplateError::InvalidKey);
        }

        let source = if let Some(provider) = self.provider {
            TemplateSource::Dynamic(provider)
        } else if let Some(body) = self.body {
            TemplateSource::Literal {
                subject: self.subject,
                body,
            }
        } else if let Some(path) = self.body_path {
            TemplateSource::Path {
                subject: self.subject,
                path,
            }
        } else {
            return Err(TemplateError::InvalidSource(self.key));
        };

        Ok((self.key, source))
    }
}

impl fmt::Debug for TemplateDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateDefinition")
            .field("key", &self.key)
            .field("subject", &self.subject)
            .field("body", &self.body)
            .field("body_path", &self.body_path)
            .field("provider", &self.provider.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Outcome of a registration
#[derive(Debug, Clone)]
pub enum Registration {
    /// Stored as given; compiled again on every send
    Raw(TemplateSource),

    /// Compiled once and reused
    Compiled(Arc<CompiledTemplate>),
}

impl Registration {
    pub fn is_compiled(&self) -> bool {
        matches!(self, Registration::Compiled(_))
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Registration::Raw(_) => "raw",
            Registration::Compiled(_) => "compiled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_definition_selects_literal_source() {
        let (key, source) = TemplateDefinition::literal("greet", "Hi", "<p>{{name}}</p>")
            .into_source()
            .unwrap();

        assert_eq!(key, "greet");
        assert!(matches!(
            source,
            TemplateSource::Literal { ref subject, ref body } if subject == "Hi" && body == "<p>{{name}}</p>"
        ));
    }

    #[test]
    fn test_body_wins_over_body_path() {
        let mut definition = TemplateDefinition::literal("both", "Subject", "<p>inline</p>");
        definition.body_path = Some(PathBuf::from("/tmp/ignored.html"));

        let (_, source) = definition.into_source().unwrap();
        assert_eq!(source.kind(), "literal");
    }

    #[test]
    fn test_provider_wins_over_everything() {
        let mut definition = TemplateDefinition::dynamic("all", || async {
            Ok::<_, anyhow::Error>(TemplateContent::new("From provider", "<p>provider</p>"))
        });
        definition.body = Some("<p>inline</p>".to_string());
        definition.body_path = Some(PathBuf::from("/tmp/ignored.html"));

        let (_, source) = definition.into_source().unwrap();
        assert_eq!(source.kind(), "dynamic");
    }

    #[test]
    fn test_definition_without_body_is_rejected() {
        let definition = TemplateDefinition {
            key: "empty".to_string(),
            subject: "Subject".to_string(),
            ..Default::default()
        };

        assert!(matches!(
            definition.into_source(),
            Err(TemplateError::InvalidSource(key)) if key == "empty"
        ));
    }

    #[test]
    fn test_definition_with_blank_key_is_rejected() {
        let definition = TemplateDefinition::literal("  ", "Subject", "Body");
        assert!(matches!(definition.into_source(), Err(TemplateError::InvalidKey)));
    }

    #[test]
    fn test_definition_deserializes_upstream_field_names() {
        let definition: TemplateDefinition = serde_json::from_value(serde_json::json!({
            "key": "reset",
            "subject": "Reset your password",
            "bodyTemplatePath": "templates/reset.html"
        }))
        .unwrap();

        let (_, source) = definition.into_source().unwrap();
        assert!(matches!(
            source,
            TemplateSource::Path { ref path, .. } if path == &PathBuf::from("templates/reset.html")
        ));
    }
}
