//! Template registration endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::error::AppError;
use crate::server::AppState;
use crate::template::{confine_path, TemplateDefinition};

#[derive(Debug, Serialize)]
pub struct RegisteredTemplate {
    pub key: String,
    /// `compiled` or `raw`, depending on the cache mode at registration
    pub mode: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredTemplates {
    pub templates: Vec<RegisteredTemplate>,
    pub total: usize,
}

/// Pin a requested `body_path` inside the configured template directory
async fn confine_body_path(
    state: &AppState,
    mut definition: TemplateDefinition,
) -> Result<TemplateDefinition, AppError> {
    let Some(requested) = definition.body_path.take() else {
        return Ok(definition);
    };
    let Some(root) = &state.settings.mailer.template_dir else {
        return Err(AppError::Validation(
            "body_path is not accepted: no template directory is configured".to_string(),
        ));
    };

    definition.body_path = Some(confine_path(root, &requested).await?);
    Ok(definition)
}

/// POST /api/v1/templates - Register a template
#[tracing::instrument(
    name = "http.register_template",
    skip(state, definition),
    fields(key = %definition.key)
)]
pub async fn register_template(
    State(state): State<AppState>,
    Json(definition): Json<TemplateDefinition>,
) -> Result<(StatusCode, Json<RegisteredTemplate>), AppError> {
    let key = definition.key.clone();
    let definition = confine_body_path(&state, definition).await?;
    let registration = state.mailer.register_template(definition).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisteredTemplate {
            key,
            mode: registration.mode().to_string(),
        }),
    ))
}

/// POST /api/v1/templates/batch - Register several templates, all or nothing
#[tracing::instrument(
    name = "http.register_templates",
    skip(state, definitions),
    fields(count = definitions.len())
)]
pub async fn register_templates(
    State(state): State<AppState>,
    Json(definitions): Json<Vec<TemplateDefinition>>,
) -> Result<(StatusCode, Json<RegisteredTemplates>), AppError> {
    if definitions.is_empty() {
        return Err(AppError::Validation("No templates given".to_string()));
    }

    let keys: Vec<String> = definitions.iter().map(|d| d.key.clone()).collect();

    let mut confined = Vec::with_capacity(definitions.len());
    for definition in definitions {
        confined.push(confine_body_path(&state, definition).await?);
    }
    let definitions = confined;

    let registrations = state.mailer.register_templates(definitions).await?;

    let templates: Vec<RegisteredTemplate> = keys
        .into_iter()
        .zip(registrations)
        .map(|(key, registration)| RegisteredTemplate {
            key,
            mode: registration.mode().to_string(),
        })
        .collect();
    let total = templates.len();

    Ok((StatusCode::CREATED, Json(RegisteredTemplates { templates, total })))
}
