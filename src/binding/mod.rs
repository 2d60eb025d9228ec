//! Request binding for axum.
//!
//! [`attach_mailer`] is a middleware that captures a fixed set of request fields
//! and attaches a [`RequestMailer`] to the request. Handlers extract the
//! `RequestMailer` and send through it; the captured fields reach templates as
//! extra data, so a template can use `{{hostname}}`, `{{originalUrl}}` or
//! `{{body.name}}` without the handler copying them.
//!
//! # Example
//!
//! ```ignore
//! let binding = bind_request_handler(mailer.clone(), Some(&smtp)).await?;
//!
//! let app = Router::new()
//!     .route("/signup", post(signup))
//!     .route_layer(middleware::from_fn_with_state(binding, attach_mailer));
//!
//! async fn signup(mailer: RequestMailer, Json(form): Json<Signup>) -> StatusCode {
//!     let request = SendEmailRequest::new("welcome").receiver(form.email).data(json!(form));
//!     match mailer.send_email(request).await {
//!         Ok(_) => StatusCode::ACCEPTED,
//!         Err(_) => StatusCode::BAD_GATEWAY,
//!     }
//! }
//! ```

mod fields;

pub use fields::REQUEST_FIELDS;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::mailer::{Mailer, MailerResult, SendEmailRequest, SentEmail};
use crate::transport::SmtpConfig;

/// Largest request body buffered for the `body` field
pub const MAX_BUFFERED_BODY: usize = 2 * 1024 * 1024;

/// State for [`attach_mailer`]
#[derive(Clone)]
pub struct MailerBinding {
    mailer: Arc<Mailer>,
    app_locals: Arc<Map<String, Value>>,
}

impl MailerBinding {
    pub fn new(mailer: Arc<Mailer>) -> Self {
        Self {
            mailer,
            app_locals: Arc::new(Map::new()),
        }
    }

    /// Application-level values added to every request's extra data
    pub fn with_app_locals(mut self, app_locals: Map<String, Value>) -> Self {
        self.app_locals = Arc::new(app_locals);
        self
    }

    pub fn mailer(&self) -> &Arc<Mailer> {
        &self.mailer
    }
}

/// Configure the transport when options are given and bind the mailer for
/// use with [`attach_mailer`].
pub async fn bind_request_handler(
    mailer: Arc<Mailer>,
    transport: Option<&SmtpConfig>,
) -> MailerResult<MailerBinding> {
    if let Some(config) = transport {
        mailer.configure_transport(config).await?;
    }

    Ok(MailerBinding::new(mailer))
}

/// Middleware attaching a [`RequestMailer`] to each request.
///
/// The body is buffered (up to [`MAX_BUFFERED_BODY`]) to capture it and is
/// handed to the next handler unchanged.
pub async fn attach_mailer(
    State(binding): State<MailerBinding>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = req.into_parts();

    let bytes = match axum::body::to_bytes(body, MAX_BUFFERED_BODY).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer request body");
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let request_fields = fields::capture(&mut parts, &bytes).await;
    parts.extensions.insert(RequestMailer {
        mailer: binding.mailer.clone(),
        app_locals: binding.app_locals.clone(),
        fields: Arc::new(request_fields),
    });

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

/// Mailer bound to the current request
#[derive(Clone)]
pub struct RequestMailer {
    mailer: Arc<Mailer>,
    app_locals: Arc<Map<String, Value>>,
    fields: Arc<Map<String, Value>>,
}

impl RequestMailer {
    /// Fields captured from the request
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn mailer(&self) -> &Arc<Mailer> {
        &self.mailer
    }

    /// Send with app locals and request fields layered over the request's
    /// own extra data.
    pub async fn send_email(&self, mut request: SendEmailRequest) -> MailerResult<SentEmail> {
        for (key, value) in self.app_locals.iter().chain(self.fields.iter()) {
            request.extra_data.insert(key.clone(), value.clone());
        }

        self.mailer.send_email(request).await
    }
}

impl<S> FromRequestParts<S> for RequestMailer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestMailer>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Mailer is not attached to this request",
        ))
    }
}
