//! OpenAI API.

use std::sync::Arc;

use async_trait::async_trait;
use jido_keyring::Keyring;
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::adapter::{AdapterBase, ProviderAdapter, bearer, insert_header};
use crate::definition::{ProviderDefinition, ProviderKind};
use crate::error::Result;
use crate::model::Model;
use crate::options::{BuildOptions, ModelQuery, NormalizeOptions, RequestOptions};
use crate::spec::{Architecture, ModelSpec};

pub const DEFINITION: ProviderDefinition = ProviderDefinition {
    id: "openai",
    name: "OpenAI",
    description: "GPT and o-series models through the OpenAI API",
    kind: ProviderKind::Direct,
    base_url: "https://api.openai.com/v1",
    requires_api_key: true,
    api_key_name: "openai_api_key",
};

/// Keyring key for the optional `OpenAI-Organization` header.
pub const ORGANIZATION_KEY: &str = "openai_organization";

/// Id prefixes of the model families the API serves.
const FAMILIES: &[&str] = &[
    "gpt-",
    "o1",
    "o3",
    "o4",
    "chatgpt-",
    "text-embedding-",
    "dall-e",
    "whisper",
    "tts",
];

#[derive(Debug)]
pub struct OpenAIAdapter {
    base: AdapterBase,
}

impl OpenAIAdapter {
    pub fn new(keyring: Arc<Keyring>) -> Self {
        Self {
            base: AdapterBase::new(DEFINITION, keyring, builtin_models()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenAIAdapter {
    fn definition(&self) -> &ProviderDefinition {
        self.base.definition()
    }

    fn request_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let organization = self
            .base
            .keyring()
            .get_string(ORGANIZATION_KEY, options.context);
        self.base.headers(options, |headers, key| {
            bearer(headers, key)?;
            if let Some(org) = &organization {
                insert_header(headers, "openai-organization", org)?;
            }
            Ok(())
        })
    }

    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSpec>> {
        self.base
            .list_models(self, query, "/models", parse_listing)
            .await
    }

    fn normalize(&self, id: &str, options: &NormalizeOptions) -> Result<String> {
        let id = self.base.clean_id(id)?;
        let id = id.strip_prefix("openai/").unwrap_or(id);
        if !FAMILIES.iter().any(|family| id.starts_with(family)) {
            return Err(self.base.invalid_id(
                id,
                format!("expected an id starting with one of {}", FAMILIES.join(", ")),
            ));
        }
        self.base.check_known(id.to_string(), options)
    }

    fn build(&self, options: &BuildOptions) -> Result<Model> {
        self.base.build_model(self, options)
    }
}

fn builtin_models() -> Vec<ModelSpec> {
    let gpt = |id: &str, name: &str, context: u64, output: u64| {
        ModelSpec::new(id)
            .named(name)
            .with_limit(context, output)
            .with_architecture(Architecture::multimodal().with_tokenizer("GPT"))
            .with_tools()
    };
    vec![
        gpt("gpt-4o", "GPT-4o", 128_000, 16_384),
        gpt("gpt-4o-mini", "GPT-4o mini", 128_000, 16_384),
        gpt("gpt-4.1", "GPT-4.1", 1_047_576, 32_768),
        gpt("gpt-4.1-mini", "GPT-4.1 mini", 1_047_576, 32_768),
        gpt("o3-mini", "o3-mini", 200_000, 100_000).with_reasoning(),
        gpt("o4-mini", "o4-mini", 200_000, 100_000).with_reasoning(),
        ModelSpec::new("text-embedding-3-small")
            .named("text-embedding-3-small")
            .with_architecture(Architecture::new("text->embedding")),
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
    owned_by: Option<String>,
}

fn parse_listing(body: &[u8]) -> Result<Vec<ModelSpec>> {
    let list: ModelList = serde_json::from_slice(body)?;
    Ok(list
        .data
        .into_iter()
        .map(|entry| ModelSpec {
            description: entry.owned_by.map(|owner| format!("owned by {owner}")),
            ..ModelSpec::new(entry.id)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::providers::test_keyring;
    use jido_keyring::ContextId;

    #[test]
    fn normalize_accepts_known_families() {
        let adapter = OpenAIAdapter::new(test_keyring(&[]));
        let plain = NormalizeOptions::default();
        for id in ["gpt-4o", "openai/gpt-4o-mini", "o1-preview", "o3-mini", "text-embedding-3-large"] {
            assert!(adapter.normalize(id, &plain).is_ok(), "{id}");
        }
        assert_eq!(adapter.normalize(" openai/gpt-4o ", &plain).unwrap(), "gpt-4o");
        assert!(matches!(
            adapter.normalize("claude-3-opus", &plain),
            Err(Error::InvalidModelId { .. })
        ));
        assert!(adapter.normalize("gpt 4o", &plain).is_err());
        assert!(adapter.normalize("", &plain).is_err());
    }

    #[test]
    fn headers_use_bearer_and_optional_organization() {
        let keyring = test_keyring(&[("OPENAI_API_KEY", "sk-base")]);
        let adapter = OpenAIAdapter::new(keyring.clone());

        let headers = adapter.request_headers(&RequestOptions::new()).unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-base");
        assert!(headers.get("openai-organization").is_none());

        let ctx = ContextId::new();
        keyring.set_override("openai_api_key", "sk-ctx", ctx).unwrap();
        keyring.set_override(ORGANIZATION_KEY, "org-1", ctx).unwrap();
        let headers = adapter
            .request_headers(&RequestOptions::new().context(ctx))
            .unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-ctx");
        assert_eq!(headers["openai-organization"], "org-1");
    }

    #[test]
    fn explicit_key_and_extra_headers_win() {
        let adapter = OpenAIAdapter::new(test_keyring(&[("openai_api_key", "sk-base")]));
        let options = RequestOptions::new()
            .api_key("sk-explicit")
            .header("x-trace-id", "abc");
        let headers = adapter.request_headers(&options).unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-explicit");
        assert_eq!(headers["x-trace-id"], "abc");
    }

    #[test]
    fn missing_key_is_an_error() {
        let adapter = OpenAIAdapter::new(test_keyring(&[("openai_api_key", "")]));
        assert!(matches!(
            adapter.request_headers(&RequestOptions::new()),
            Err(Error::MissingApiKey { key, .. }) if key == "openai_api_key"
        ));
    }

    #[test]
    fn build_applies_defaults_and_overrides() {
        let adapter = OpenAIAdapter::new(test_keyring(&[("openai_api_key", "sk-base")]));

        let model = adapter.build(&BuildOptions::new("gpt-4o")).unwrap();
        assert_eq!(model.id, "gpt-4o");
        assert_eq!(model.provider, "openai");
        assert_eq!(model.temperature, 0.7);
        assert_eq!(model.max_tokens, 1024);
        assert_eq!(model.specifier(), "openai:gpt-4o");

        let model = adapter
            .build(
                &BuildOptions::new("gpt-4o-2024-11-20")
                    .api_key("sk-explicit")
                    .temperature(0.2)
                    .max_tokens(256)
                    .base_url("http://localhost:8080/v1/"),
            )
            .unwrap();
        assert_eq!(model.name, "gpt-4o-2024-11-20");
        assert_eq!(model.api_key.as_deref(), Some("sk-explicit"));
        assert_eq!(model.base_url, "http://localhost:8080/v1");
        assert_eq!(model.max_tokens, 256);
        assert_eq!(model.context_length, None);

        assert!(matches!(
            adapter.build(&BuildOptions::default()),
            Err(Error::MissingModelId(p)) if p == "openai"
        ));
    }

    #[test]
    fn debug_redacts_the_api_key() {
        let adapter = OpenAIAdapter::new(test_keyring(&[("openai_api_key", "sk-secret")]));
        let model = adapter.build(&BuildOptions::new("gpt-4o")).unwrap();
        let printed = format!("{model:?}");
        assert!(!printed.contains("sk-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
