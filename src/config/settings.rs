use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::env;
use std::path::PathBuf;

use crate::template::TemplateDefinition;
use crate::transport::SmtpConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    /// Relay used for delivery; without it sends fail with a missing transport
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Values merged into every render context
    #[serde(default)]
    pub locals: Map<String, Value>,
    /// Values added to the extra data of request-bound sends
    #[serde(default)]
    pub app_locals: Map<String, Value>,
    /// Templates registered at startup
    #[serde(default)]
    pub templates: Vec<TemplateDefinition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of the human-readable format
    #[serde(default)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailerConfig {
    /// Compile templates at registration
    #[serde(default)]
    pub cache: bool,
    /// Seeds the `sender` global local
    #[serde(default)]
    pub default_sender: Option<String>,
    /// Directory that `body_path` templates registered over HTTP must live in.
    /// Without it the HTTP API accepts inline bodies only.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(default_port()))?
            .set_default("log.level", default_log_level())?
            .set_default("mailer.cache", false)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // MAILER__SERVER__PORT, MAILER__SMTP__HOST, MAILER__MAILER__CACHE, etc.
            .add_source(
                Environment::with_prefix("MAILER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Parse settings from a TOML document, without files or environment
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Global locals with the configured default sender applied
    pub fn initial_locals(&self) -> Map<String, Value> {
        let mut locals = self.locals.clone();
        if let Some(sender) = &self.mailer.default_sender {
            locals.insert("sender".to_string(), Value::from(sender.as_str()));
        }
        locals
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
