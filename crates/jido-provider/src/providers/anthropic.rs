//! Anthropic Messages API.

use std::sync::Arc;

use async_trait::async_trait;
use jido_keyring::Keyring;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::adapter::{AdapterBase, ProviderAdapter, insert_header};
use crate::definition::{ProviderDefinition, ProviderKind};
use crate::error::Result;
use crate::model::Model;
use crate::options::{BuildOptions, ModelQuery, NormalizeOptions, RequestOptions};
use crate::spec::{Architecture, ModelSpec};

pub const DEFINITION: ProviderDefinition = ProviderDefinition {
    id: "anthropic",
    name: "Anthropic",
    description: "Claude models through the Anthropic API",
    kind: ProviderKind::Direct,
    base_url: "https://api.anthropic.com/v1",
    requires_api_key: true,
    api_key_name: "anthropic_api_key",
};

/// Value of the `anthropic-version` header.
pub const API_VERSION: &str = "2023-06-01";

#[derive(Debug)]
pub struct AnthropicAdapter {
    base: AdapterBase,
}

impl AnthropicAdapter {
    pub fn new(keyring: Arc<Keyring>) -> Self {
        Self {
            base: AdapterBase::new(DEFINITION, keyring, builtin_models()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn definition(&self) -> &ProviderDefinition {
        self.base.definition()
    }

    fn request_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        self.base.headers(options, |headers, key| {
            insert_header(headers, "x-api-key", key)?;
            insert_header(headers, "anthropic-version", API_VERSION)
        })
    }

    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSpec>> {
        self.base
            .list_models(self, query, "/models", parse_listing)
            .await
    }

    fn normalize(&self, id: &str, options: &NormalizeOptions) -> Result<String> {
        let id = self.base.clean_id(id)?;
        let id = id.strip_prefix("anthropic/").unwrap_or(id);
        if !id.starts_with("claude-") {
            return Err(self
                .base
                .invalid_id(id, "Anthropic model ids start with 'claude-'"));
        }
        self.base.check_known(id.to_string(), options)
    }

    fn build(&self, options: &BuildOptions) -> Result<Model> {
        self.base.build_model(self, options)
    }
}

fn builtin_models() -> Vec<ModelSpec> {
    let claude = |id: &str, name: &str, output: u64| {
        ModelSpec::new(id)
            .named(name)
            .with_limit(200_000, output)
            .with_architecture(Architecture::multimodal().with_tokenizer("Claude"))
            .with_tools()
    };
    vec![
        claude("claude-3-5-haiku-latest", "Claude Haiku 3.5", 8_192),
        claude("claude-3-5-sonnet-latest", "Claude Sonnet 3.5", 8_192),
        claude("claude-3-7-sonnet-latest", "Claude Sonnet 3.7", 64_000).with_reasoning(),
        claude("claude-sonnet-4-0", "Claude Sonnet 4", 64_000).with_reasoning(),
        claude("claude-opus-4-0", "Claude Opus 4", 32_000).with_reasoning(),
    ]
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
    #[serde(default)]
    display_name: Option<String>,
}

fn parse_listing(body: &[u8]) -> Result<Vec<ModelSpec>> {
    let list: ModelList = serde_json::from_slice(body)?;
    Ok(list
        .data
        .into_iter()
        .map(|entry| ModelSpec {
            name: entry.display_name,
            architecture: Some(Architecture::multimodal().with_tokenizer("Claude")),
            ..ModelSpec::new(entry.id)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::test_keyring;

    #[test]
    fn normalize_strips_vendor_prefix() {
        let adapter = AnthropicAdapter::new(test_keyring(&[]));
        let plain = NormalizeOptions::default();
        assert_eq!(
            adapter.normalize("anthropic/claude-3-5-haiku-latest", &plain).unwrap(),
            "claude-3-5-haiku-latest"
        );
        assert!(matches!(
            adapter.normalize("gpt-4o", &plain),
            Err(Error::InvalidModelId { provider, .. }) if provider == "anthropic"
        ));
        assert!(adapter.normalize("claude-unknown", &plain).is_ok());
        assert!(adapter.normalize("claude-unknown", &NormalizeOptions::strict()).is_err());
    }

    #[test]
    fn headers_carry_key_and_version() {
        let adapter = AnthropicAdapter::new(test_keyring(&[("ANTHROPIC_API_KEY", "sk-ant")]));
        let headers = adapter.request_headers(&RequestOptions::new()).unwrap();
        assert_eq!(headers["x-api-key"], "sk-ant");
        assert_eq!(headers["anthropic-version"], API_VERSION);
        assert_eq!(headers["content-type"], "application/json");
    }

    #[test]
    fn build_fills_catalog_metadata() {
        let adapter = AnthropicAdapter::new(test_keyring(&[("anthropic_api_key", "sk-ant")]));
        let model = adapter
            .build(&BuildOptions::new("claude-3-5-haiku-latest"))
            .unwrap();
        assert_eq!(model.name, "Claude Haiku 3.5");
        assert_eq!(model.api_key.as_deref(), Some("sk-ant"));
        assert_eq!(model.base_url, DEFINITION.base_url);
        assert_eq!(model.context_length, Some(200_000));
        assert_eq!(model.architecture.modality, "text+image->text");
    }

    #[test]
    fn listing_uses_display_names() {
        let body = br#"{"data":[{"id":"claude-x","display_name":"Claude X","type":"model"}],"has_more":false}"#;
        let models = parse_listing(body).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].display_name(), "Claude X");
    }
}
