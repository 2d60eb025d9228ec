//! Template registry dispatching to the cache-mode strategy

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Serialize;

use crate::metrics::TemplateMetrics;

use super::renderer::CompiledTemplate;
use super::strategy::{EagerCompiled, LazyRecompiled, TemplateStrategy};
use super::types::{Registration, TemplateDefinition, TemplateResult};

/// Entry counts per storage strategy
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RegistryStats {
    pub compiled: usize,
    pub raw: usize,
}

/// Registry of email templates.
///
/// Every operation takes the current cache flag. With `cache = true` templates
/// are compiled at registration; with `cache = false` raw sources are stored and
/// compiled on each resolution. The flag is read per call, so a template
/// registered under one mode cannot be resolved under the other.
pub struct TemplateRegistry {
    eager: EagerCompiled,
    lazy: LazyRecompiled,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self {
            eager: EagerCompiled::new(),
            lazy: LazyRecompiled::new(),
        }
    }

    /// Strategy for the given cache flag
    pub fn strategy(&self, cache: bool) -> &dyn TemplateStrategy {
        if cache {
            &self.eager
        } else {
            &self.lazy
        }
    }

    /// Register a template
    #[tracing::instrument(
        name = "registry.register",
        skip(self, definition),
        fields(key = %definition.key)
    )]
    pub async fn register(
        &self,
        definition: TemplateDefinition,
        cache: bool,
    ) -> TemplateResult<Registration> {
        let (key, source) = definition.into_source()?;
        let kind = source.kind();
        let strategy = self.strategy(cache);

        let registration = strategy.register(key.clone(), source).await?;

        TemplateMetrics::record_registered(strategy.name());
        tracing::debug!(
            key = %key,
            source = kind,
            mode = registration.mode(),
            "Template registered"
        );

        Ok(registration)
    }

    /// Register several templates concurrently.
    ///
    /// Results are returned in input order. The first failure fails the whole
    /// batch; registrations that already completed stay in place.
    pub async fn register_many(
        &self,
        definitions: Vec<TemplateDefinition>,
        cache: bool,
    ) -> TemplateResult<Vec<Registration>> {
        try_join_all(
            definitions
                .into_iter()
                .map(|definition| self.register(definition, cache)),
        )
        .await
    }

    /// Resolve the compiled pair for a key
    pub async fn resolve(&self, key: &str, cache: bool) -> TemplateResult<Arc<CompiledTemplate>> {
        let compiled = self.strategy(cache).resolve(key).await?;
        tracing::trace!(key = %key, cache, "Template resolved");
        Ok(compiled)
    }

    /// Check if a key is registered under the given mode
    pub fn contains(&self, key: &str, cache: bool) -> bool {
        self.strategy(cache).contains(key)
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            compiled: self.eager.count(),
            raw: self.lazy.count(),
        }
    }
}
