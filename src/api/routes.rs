use axum::{
    routing::{get, post},
    Router,
};

use crate::server::AppState;

use super::health::health;
use super::metrics::prometheus_metrics;
use super::template::{register_template, register_templates};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health & Metrics
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics))
        // Template registration
        .nest(
            "/api/v1",
            Router::new()
                .route("/templates", post(register_template))
                .route("/templates/batch", post(register_templates)),
        )
}
