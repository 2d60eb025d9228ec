//! Storage strategies for registered templates.
//!
//! `EagerCompiled` compiles once at registration and serves the compiled pair.
//! `LazyRecompiled` keeps the raw source and compiles on every resolution, so
//! file and provider sources are re-read each time.
//!
//! The two strategies keep separate maps. A key registered through one is not
//! visible through the other.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::loader::compile_source;
use super::renderer::CompiledTemplate;
use super::types::{Registration, TemplateError, TemplateResult, TemplateSource};

/// How templates are stored at registration and resolved at send time
#[async_trait]
pub trait TemplateStrategy: Send + Sync {
    /// Strategy name for logging and metrics
    fn name(&self) -> &'static str;

    /// Store a template under `key`, replacing any previous entry
    async fn register(&self, key: String, source: TemplateSource) -> TemplateResult<Registration>;

    /// Produce the compiled pair for `key`
    async fn resolve(&self, key: &str) -> TemplateResult<Arc<CompiledTemplate>>;

    /// Check if a key is stored
    fn contains(&self, key: &str) -> bool;

    /// Number of stored entries
    fn count(&self) -> usize;
}

/// Compile on registration, reuse on every send
#[derive(Default)]
pub struct EagerCompiled {
    entries: DashMap<String, Arc<CompiledTemplate>>,
}

impl EagerCompiled {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStrategy for EagerCompiled {
    fn name(&self) -> &'static str {
        "compiled"
    }

    async fn register(&self, key: String, source: TemplateSource) -> TemplateResult<Registration> {
        let compiled = Arc::new(compile_source(&key, &source).await?);
        self.entries.insert(key, compiled.clone());
        Ok(Registration::Compiled(compiled))
    }

    async fn resolve(&self, key: &str) -> TemplateResult<Arc<CompiledTemplate>> {
        self.entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TemplateError::Unregistered(key.to_string()))
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn count(&self) -> usize {
        self.entries.len()
    }
}

/// Keep the raw source, compile on every send
#[derive(Default)]
pub struct LazyRecompiled {
    entries: DashMap<String, TemplateSource>,
}

impl LazyRecompiled {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStrategy for LazyRecompiled {
    fn name(&self) -> &'static str {
        "raw"
    }

    async fn register(&self, key: String, source: TemplateSource) -> TemplateResult<Registration> {
        self.entries.insert(key, source.clone());
        Ok(Registration::Raw(source))
    }

    async fn resolve(&self, key: &str) -> TemplateResult<Arc<CompiledTemplate>> {
        // Clone out of the map so no shard guard is held across the await
        let source = self
            .entries
            .get(key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| TemplateError::Unregistered(key.to_string()))?;

        Ok(Arc::new(compile_source(key, &source).await?))
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn count(&self) -> usize {
        self.entries.len()
    }
}
