//! Email template registry.
//!
//! This module provides:
//! - Template sources (literal, file path, or async provider)
//! - Handlebars compilation into reusable renderers (HTML-escaped bodies)
//! - A registry storing either compiled templates (cache on) or raw sources
//!   that are recompiled on every resolution (cache off)
//!
//! # Example
//!
//! ```ignore
//! let registry = TemplateRegistry::new();
//!
//! registry
//!     .register(
//!         TemplateDefinition::literal("welcome", "Welcome {{name}}", "<p>Hi {{name}}</p>"),
//!         true,
//!     )
//!     .await?;
//!
//! let compiled = registry.resolve("welcome", true).await?;
//! let context = json!({ "name": "Ada" });
//! assert_eq!(compiled.render_body(context.as_object().unwrap())?, "<p>Hi Ada</p>");
//! ```

mod loader;
mod registry;
mod renderer;
mod strategy;
mod types;

pub use loader::{compile_source, confine_path, resolve_content, FALLBACK_BODY};
pub use registry::{RegistryStats, TemplateRegistry};
pub use renderer::{CompiledTemplate, Escape, Renderer};
pub use strategy::{EagerCompiled, LazyRecompiled, TemplateStrategy};
pub use types::{
    Registration, TemplateContent, TemplateDefinition, TemplateError, TemplateProvider,
    TemplateResult, TemplateSource,
};
