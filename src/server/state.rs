use std::sync::Arc;
use std::time::Instant;

use serde_json::{Map, Value};

use crate::binding::{bind_request_handler, MailerBinding};
use crate::config::Settings;
use crate::mailer::{Mailer, MailerOptions, MailerResult};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub mailer: Arc<Mailer>,
    pub binding: MailerBinding,
    pub started_at: Instant,
}

impl AppState {
    /// Apply settings to a fresh mailer: options, locals, transport, then the
    /// configured templates.
    pub async fn new(settings: Settings) -> MailerResult<Self> {
        let mailer = Arc::new(Mailer::new());

        let mut options = Map::new();
        options.insert(
            MailerOptions::CACHE.to_string(),
            Value::Bool(settings.mailer.cache),
        );
        mailer.set_options(options).await;
        mailer.set_global_locals(settings.initial_locals()).await;

        let binding = bind_request_handler(mailer.clone(), settings.smtp.as_ref()).await?;
        mailer.register_templates(settings.templates.clone()).await?;

        tracing::info!(
            cache = settings.mailer.cache,
            templates = settings.templates.len(),
            transport = settings.smtp.is_some(),
            "Mailer initialized"
        );

        Ok(Self::with_binding(settings, binding))
    }

    /// State around an already configured mailer
    pub fn from_mailer(settings: Settings, mailer: Arc<Mailer>) -> Self {
        Self::with_binding(settings, MailerBinding::new(mailer))
    }

    fn with_binding(settings: Settings, binding: MailerBinding) -> Self {
        let binding = binding.with_app_locals(settings.app_locals.clone());

        Self {
            settings: Arc::new(settings),
            mailer: binding.mailer().clone(),
            binding,
            started_at: Instant::now(),
        }
    }
}
