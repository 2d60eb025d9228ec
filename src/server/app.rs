use axum::{
    http::HeaderValue,
    middleware,
    routing::post,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::api::{api_routes, send_email};
use crate::binding::{attach_mailer, MAX_BUFFERED_BODY};

use super::AppState;

pub fn create_app(state: AppState) -> Router {
    // Routes that send mail get the request-bound mailer
    let email_routes = Router::new()
        .route("/api/v1/emails/send", post(send_email))
        .route_layer(middleware::from_fn_with_state(
            state.binding.clone(),
            attach_mailer,
        ));

    Router::new()
        .merge(api_routes())
        .merge(email_routes)
        // Add middleware
        .layer(RequestBodyLimitLayer::new(MAX_BUFFERED_BODY))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.settings.server.cors_origins))
        // Add state
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
