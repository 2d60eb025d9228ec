//! Health check endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::server::AppState;
use crate::template::RegistryStats;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub mailer: MailerHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct MailerHealthResponse {
    pub cache: bool,
    pub transport_configured: bool,
    pub templates: RegistryStats,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let transport_configured = state.mailer.has_transport().await;
    let status = if transport_configured { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        mailer: MailerHealthResponse {
            cache: state.mailer.cache_enabled().await,
            transport_configured,
            templates: state.mailer.registry().stats(),
        },
    })
}
