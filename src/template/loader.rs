//! Resolution of template sources into concrete text

use std::path::{Path, PathBuf};

use crate::metrics::TemplateMetrics;

use super::renderer::CompiledTemplate;
use super::types::{TemplateContent, TemplateError, TemplateResult, TemplateSource};

/// Body used when a template file cannot be read
pub const FALLBACK_BODY: &str = "no template";

/// Read a template body from disk, falling back to [`FALLBACK_BODY`] on failure
async fn read_body(path: &Path) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read template body, using fallback"
            );
            TemplateMetrics::record_fallback();
            FALLBACK_BODY.to_string()
        }
    }
}

/// Resolve a source to its subject and body text.
///
/// Path sources are read and dynamic sources are invoked on every call.
pub async fn resolve_content(key: &str, source: &TemplateSource) -> TemplateResult<TemplateContent> {
    match source {
        TemplateSource::Literal { subject, body } => {
            Ok(TemplateContent::new(subject.clone(), body.clone()))
        }
        TemplateSource::Path { subject, path } => {
            Ok(TemplateContent::new(subject.clone(), read_body(path).await))
        }
        TemplateSource::Dynamic(provider) => {
            provider
                .provide()
                .await
                .map_err(|e| TemplateError::Provider {
                    key: key.to_string(),
                    message: e.to_string(),
                })
        }
    }
}

/// Resolve `requested` against `root` and reject anything that does not end
/// up inside it once symlinks and `..` are resolved. The file must exist.
pub async fn confine_path(root: &Path, requested: &Path) -> TemplateResult<PathBuf> {
    let rejected = |reason: &str| TemplateError::InvalidPath {
        path: requested.display().to_string(),
        reason: reason.to_string(),
    };

    let root = tokio::fs::canonicalize(root).await.map_err(|e| {
        tracing::warn!(root = %root.display(), error = %e, "Template directory is not readable");
        rejected("template directory is not readable")
    })?;
    let candidate = tokio::fs::canonicalize(root.join(requested))
        .await
        .map_err(|_| rejected("file not found in the template directory"))?;

    if !candidate.starts_with(&root) {
        tracing::warn!(path = %requested.display(), "Template path escapes the template directory");
        return Err(rejected("outside the template directory"));
    }

    Ok(candidate)
}

/// Resolve and compile a source
pub async fn compile_source(key: &str, source: &TemplateSource) -> TemplateResult<CompiledTemplate> {
    let content = resolve_content(key, source).await?;
    let compiled = CompiledTemplate::compile(key, &content)?;

    TemplateMetrics::record_compiled(source.kind());
    tracing::debug!(
        key = %key,
        source = source.kind(),
        body_len = content.body.len(),
        "Template compiled"
    );

    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}", uuid::Uuid::new_v4(), name))
    }

    #[tokio::test]
    async fn test_path_source_reads_file() {
        let path = temp_path("invoice.html");
        tokio::fs::write(&path, "<p>Invoice {{number}}</p>").await.unwrap();

        let source = TemplateSource::Path {
            subject: "Invoice".to_string(),
            path: path.clone(),
        };
        let compiled = compile_source("invoice", &source).await.unwrap();
        let ctx = json!({"number": "INV-9"});

        assert_eq!(
            compiled.render_body(ctx.as_object().unwrap()).unwrap(),
            "<p>Invoice INV-9</p>"
        );

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_uses_fallback() {
        let source = TemplateSource::Path {
            subject: "Missing".to_string(),
            path: temp_path("does-not-exist.html"),
        };

        let content = resolve_content("missing", &source).await.unwrap();
        assert_eq!(content.subject, "Missing");
        assert_eq!(content.body, FALLBACK_BODY);

        let compiled = compile_source("missing", &source).await.unwrap();
        let ctx = json!({"anything": "ignored"});
        assert_eq!(compiled.render_body(ctx.as_object().unwrap()).unwrap(), "no template");
        assert_eq!(compiled.render_body(&Map::new()).unwrap(), "no template");
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let source = TemplateSource::Dynamic(std::sync::Arc::new(|| async {
            Err::<TemplateContent, _>(anyhow::anyhow!("store offline"))
        }));

        let result = resolve_content("remote", &source).await;
        assert!(matches!(
            result,
            Err(TemplateError::Provider { ref key, ref message })
                if key == "remote" && message == "store offline"
        ));
    }

    #[tokio::test]
    async fn test_confine_path_accepts_files_inside_root() {
        let root = temp_path("templates");
        tokio::fs::create_dir_all(root.join("welcome")).await.unwrap();
        tokio::fs::write(root.join("welcome/body.html"), "<p>hi</p>").await.unwrap();

        let resolved = confine_path(&root, Path::new("welcome/body.html")).await.unwrap();
        assert!(resolved.ends_with("welcome/body.html"));
        assert!(resolved.is_absolute());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn test_confine_path_rejects_escapes() {
        let root = temp_path("templates");
        tokio::fs::create_dir_all(&root).await.unwrap();
        let outside = temp_path("secret.txt");
        tokio::fs::write(&outside, "secret").await.unwrap();
        let relative = PathBuf::from("..").join(outside.file_name().unwrap());

        for requested in [relative.as_path(), outside.as_path(), Path::new("/etc/passwd")] {
            assert!(matches!(
                confine_path(&root, requested).await,
                Err(TemplateError::InvalidPath { .. })
            ));
        }
        assert!(matches!(
            confine_path(&root, Path::new("missing.html")).await,
            Err(TemplateError::InvalidPath { .. })
        ));

        tokio::fs::remove_dir_all(&root).await.unwrap();
        tokio::fs::remove_file(&outside).await.unwrap();
    }
}
