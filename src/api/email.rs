//! Email send endpoint.

use axum::Json;

use crate::binding::RequestMailer;
use crate::error::AppError;
use crate::mailer::{SendEmailRequest, SentEmail};

/// POST /api/v1/emails/send - Render a registered template and deliver it.
///
/// Request fields (`hostname`, `originalUrl`, `body`, ...) are available to
/// the template.
#[tracing::instrument(name = "http.send_email", skip(mailer, request), fields(key = %request.key))]
pub async fn send_email(
    mailer: RequestMailer,
    Json(request): Json<SendEmailRequest>,
) -> Result<Json<SentEmail>, AppError> {
    let sent = mailer.send_email(request).await?;
    Ok(Json(sent))
}
