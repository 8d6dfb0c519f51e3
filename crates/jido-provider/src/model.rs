//! The provider-agnostic model descriptor produced by
//! [`ProviderAdapter::build`](crate::ProviderAdapter::build).

use std::fmt;

use serde::Serialize;

use crate::spec::Architecture;

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Everything needed to address one model through one provider.
#[derive(Clone, PartialEq, Serialize)]
pub struct Model {
    /// Canonical model id for the provider.
    pub id: String,
    pub name: String,
    /// Provider id, e.g. `"openrouter"`.
    pub provider: String,
    /// Resolved API key. Never serialized.
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_retries: u32,
    pub architecture: Architecture,
    pub description: Option<String>,
    /// Context window, when the catalog knows it.
    pub context_length: Option<u64>,
}

impl Model {
    /// `provider:id`, the form accepted by
    /// [`ProviderRegistry::build_from_string`](crate::ProviderRegistry::build_from_string).
    pub fn specifier(&self) -> String {
        format!("{}:{}", self.provider, self.id)
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("architecture", &self.architecture)
            .field("description", &self.description)
            .field("context_length", &self.context_length)
            .finish()
    }
}
