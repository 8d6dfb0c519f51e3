//! Built-in provider adapters.

use std::sync::Arc;

use jido_keyring::Keyring;

use crate::adapter::ProviderAdapter;

pub mod anthropic;
pub mod cloudflare;
pub mod google;
pub mod openai;
pub mod openrouter;

pub use anthropic::AnthropicAdapter;
pub use cloudflare::CloudflareAdapter;
pub use google::GoogleAdapter;
pub use openai::OpenAIAdapter;
pub use openrouter::OpenRouterAdapter;

/// One instance of every built-in adapter, sharing `keyring`.
pub fn builtin(keyring: Arc<Keyring>) -> Vec<Arc<dyn ProviderAdapter>> {
    vec![
        Arc::new(AnthropicAdapter::new(keyring.clone())),
        Arc::new(OpenAIAdapter::new(keyring.clone())),
        Arc::new(OpenRouterAdapter::new(keyring.clone())),
        Arc::new(CloudflareAdapter::new(keyring.clone())),
        Arc::new(GoogleAdapter::new(keyring)),
    ]
}

#[cfg(test)]
pub(crate) fn test_keyring(base: &[(&str, &str)]) -> Arc<Keyring> {
    Arc::new(Keyring::from_base(
        "provider-test",
        base.iter()
            .map(|(k, v)| (k.to_string(), jido_keyring::Value::from(*v)))
            .collect(),
    ))
}
