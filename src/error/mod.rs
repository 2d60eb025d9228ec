use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::mailer::MailerError;
use crate::template::TemplateError;
use crate::transport::TransportError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Mailer(#[from] MailerError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TemplateError> for AppError {
    fn from(err: TemplateError) -> Self {
        AppError::Mailer(MailerError::Template(err))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Check if running in production mode (based on RUN_MODE env var)
fn is_production() -> bool {
    std::env::var("RUN_MODE")
        .map(|m| m == "production" || m == "prod")
        .unwrap_or(false)
}

/// Message for the client, hiding upstream details in production
fn upstream_message(log_msg: &str, public: &str) -> String {
    if is_production() {
        public.to_string()
    } else {
        log_msg.to_string()
    }
}

fn mailer_status(err: &MailerError) -> (StatusCode, &'static str) {
    match err {
        MailerError::Template(TemplateError::Unregistered(_)) => {
            (StatusCode::NOT_FOUND, "TEMPLATE_NOT_FOUND")
        }
        MailerError::Template(TemplateError::InvalidKey) => (StatusCode::BAD_REQUEST, "INVALID_KEY"),
        MailerError::Template(TemplateError::InvalidSource(_)) => {
            (StatusCode::BAD_REQUEST, "INVALID_TEMPLATE")
        }
        MailerError::Template(TemplateError::Syntax { .. }) => {
            (StatusCode::BAD_REQUEST, "INVALID_TEMPLATE")
        }
        MailerError::Template(TemplateError::InvalidPath { .. }) => {
            (StatusCode::BAD_REQUEST, "INVALID_TEMPLATE_PATH")
        }
        MailerError::Template(TemplateError::Render { .. }) => {
            (StatusCode::UNPROCESSABLE_ENTITY, "RENDER_FAILED")
        }
        MailerError::Template(TemplateError::Provider { .. }) => {
            (StatusCode::BAD_GATEWAY, "TEMPLATE_PROVIDER_ERROR")
        }
        MailerError::MissingTransport => {
            (StatusCode::SERVICE_UNAVAILABLE, "TRANSPORT_NOT_CONFIGURED")
        }
        MailerError::MissingSender => (StatusCode::BAD_REQUEST, "MISSING_SENDER"),
        MailerError::MissingReceiver => (StatusCode::BAD_REQUEST, "MISSING_RECEIVER"),
        MailerError::Transport(TransportError::InvalidAddress(_)) => {
            (StatusCode::BAD_REQUEST, "INVALID_ADDRESS")
        }
        MailerError::Transport(_) => (StatusCode::BAD_GATEWAY, "DELIVERY_FAILED"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, client_message, log_message) = match &self {
            AppError::Config(e) => {
                let log_msg = e.to_string();
                let client_msg = upstream_message(&log_msg, "Configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", client_msg, log_msg)
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                msg.clone(),
            ),
            AppError::Mailer(e) => {
                let (status, code) = mailer_status(e);
                let log_msg = e.to_string();
                let client_msg = if status.is_server_error() {
                    upstream_message(&log_msg, "Mail delivery unavailable")
                } else {
                    log_msg.clone()
                };
                (status, code, client_msg, log_msg)
            }
            AppError::Internal(e) => {
                let log_msg = e.clone();
                let client_msg = upstream_message(&log_msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", client_msg, log_msg)
            }
        };

        // Always log the detailed error server-side
        tracing::error!(
            code = %code,
            status = %status.as_u16(),
            message = %log_message,
            "API error"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: client_message,
            },
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailer_error_status() {
        let cases = [
            (
                MailerError::Template(TemplateError::Unregistered("ghost".into())),
                StatusCode::NOT_FOUND,
            ),
            (MailerError::MissingTransport, StatusCode::SERVICE_UNAVAILABLE),
            (
                MailerError::Template(TemplateError::InvalidPath {
                    path: "/etc/passwd".into(),
                    reason: "outside the template directory".into(),
                }),
                StatusCode::BAD_REQUEST,
            ),
            (MailerError::MissingReceiver, StatusCode::BAD_REQUEST),
            (
                MailerError::Transport(TransportError::Delivery("421".into())),
                StatusCode::BAD_GATEWAY,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_validation_is_bad_request() {
        let response = AppError::Validation("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
