mod settings;

pub use settings::{LogConfig, MailerConfig, ServerConfig, Settings};
