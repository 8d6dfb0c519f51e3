//! Provider lookup by id and `provider:model` resolution.

use std::collections::HashMap;
use std::sync::Arc;

use jido_keyring::Keyring;
use tracing::{debug, info, warn};

use crate::adapter::ProviderAdapter;
use crate::definition::ProviderDefinition;
use crate::error::{Error, Result};
use crate::model::Model;
use crate::options::{BuildOptions, ModelQuery};
use crate::providers;
use crate::spec::ModelSpec;

/// Adapters keyed by provider id.
///
/// # Example
///
/// ```ignore
/// use jido_provider::{BuildOptions, ProviderRegistry};
///
/// let registry = ProviderRegistry::builtin(keyring);
/// let model = registry.build_from_string(
///     "openrouter:anthropic/claude-3.5-sonnet",
///     BuildOptions::default().temperature(0.2),
/// )?;
/// ```
#[derive(Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in adapter, resolving credentials from
    /// `keyring`.
    pub fn builtin(keyring: Arc<Keyring>) -> Self {
        let mut registry = Self::new();
        for adapter in providers::builtin(keyring) {
            registry.register(adapter);
        }
        info!(count = registry.adapters.len(), "provider registry initialized");
        registry
    }

    /// Register `adapter` under its definition id, returning any adapter it
    /// replaces.
    pub fn register(
        &mut self,
        adapter: Arc<dyn ProviderAdapter>,
    ) -> Option<Arc<dyn ProviderAdapter>> {
        let id = adapter.definition().id.to_string();
        debug!(provider = %id, "registering provider");
        let previous = self.adapters.insert(id.clone(), adapter);
        if previous.is_some() {
            warn!(provider = %id, "replaced existing provider registration");
        }
        previous
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn ProviderAdapter>> {
        self.adapters
            .get(id)
            .cloned()
            .ok_or_else(|| Error::ProviderNotFound(id.to_string()))
    }

    pub fn has_provider(&self, id: &str) -> bool {
        self.adapters.contains_key(id)
    }

    /// Definitions of every registered provider, sorted by id.
    pub fn providers(&self) -> Vec<ProviderDefinition> {
        let mut definitions: Vec<ProviderDefinition> = self
            .adapters
            .values()
            .map(|adapter| adapter.definition().clone())
            .collect();
        definitions.sort_by_key(|definition| definition.id);
        definitions
    }

    /// Build a model through the adapter registered as `provider`.
    pub fn build(&self, provider: &str, options: &BuildOptions) -> Result<Model> {
        self.get(provider)?.build(options)
    }

    /// Parse a combined `"provider:model"` string and build the model.
    ///
    /// Only the first `:` separates the provider, so model ids may carry
    /// their own suffix (`openrouter:meta-llama/llama-3-8b:free`). The model
    /// in `options` is replaced by the one in `specifier`.
    pub fn build_from_string(&self, specifier: &str, mut options: BuildOptions) -> Result<Model> {
        let (provider, model) = split_specifier(specifier)?;
        options.model = Some(model.to_string());
        self.build(provider, &options)
    }

    pub async fn list_models(&self, provider: &str, query: &ModelQuery) -> Result<Vec<ModelSpec>> {
        self.get(provider)?.list_models(query).await
    }

    /// Metadata for a `"provider:model"` specifier.
    pub async fn model(&self, specifier: &str, query: &ModelQuery) -> Result<ModelSpec> {
        let (provider, model) = split_specifier(specifier)?;
        self.get(provider)?.model(model, query).await
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("providers", &ids)
            .finish()
    }
}

fn split_specifier(specifier: &str) -> Result<(&str, &str)> {
    match specifier.split_once(':') {
        Some((provider, model)) if !provider.is_empty() && !model.is_empty() => {
            Ok((provider, model))
        }
        _ => Err(Error::InvalidSpecifier(specifier.to_string())),
    }
}
