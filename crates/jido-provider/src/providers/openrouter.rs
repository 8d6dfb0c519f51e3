//! OpenRouter, a gateway to models from many vendors.

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
use crate::spec::{Architecture, ModelCost, ModelLimit, ModelSpec};

pub const DEFINITION: ProviderDefinition = ProviderDefinition {
    id: "openrouter",
    name: "OpenRouter",
    description: "Unified API routing to models from many vendors",
    kind: ProviderKind::Proxy,
    base_url: "https://openrouter.ai/api/v1",
    requires_api_key: true,
    api_key_name: "openrouter_api_key",
};

/// Keyring key for the `HTTP-Referer` attribution header.
pub const SITE_URL_KEY: &str = "openrouter_site_url";
/// Keyring key for the `X-Title` attribution header.
pub const APP_NAME_KEY: &str = "openrouter_app_name";

#[derive(Debug)]
pub struct OpenRouterAdapter {
    base: AdapterBase,
}

impl OpenRouterAdapter {
    pub fn new(keyring: Arc<Keyring>) -> Self {
        Self {
            base: AdapterBase::new(DEFINITION, keyring, builtin_models()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn definition(&self) -> &ProviderDefinition {
        self.base.definition()
    }

    fn request_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let keyring = self.base.keyring();
        let site_url = keyring.get_string(SITE_URL_KEY, options.context);
        let app_name = keyring.get_string(APP_NAME_KEY, options.context);
        self.base.headers(options, |headers, key| {
            bearer(headers, key)?;
            if let Some(url) = &site_url {
                insert_header(headers, "http-referer", url)?;
            }
            if let Some(name) = &app_name {
                insert_header(headers, "x-title", name)?;
            }
            Ok(())
        })
    }

    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSpec>> {
        self.base
            .list_models(self, query, "/models", parse_listing)
            .await
    }

    /// Ids take the form `vendor/slug`, optionally with a `:variant`
    /// suffix such as `:free`.
    fn normalize(&self, id: &str, options: &NormalizeOptions) -> Result<String> {
        let id = self.base.clean_id(id)?;
        let (path, variant) = match id.split_once(':') {
            Some((path, variant)) => (path, Some(variant)),
            None => (id, None),
        };
        let Some((vendor, slug)) = path.split_once('/') else {
            return Err(self.base.invalid_id(id, "expected 'vendor/model'"));
        };
        if vendor.is_empty() || slug.is_empty() || slug.contains('/') {
            return Err(self.base.invalid_id(id, "expected 'vendor/model'"));
        }
        if variant.is_some_and(str::is_empty) {
            return Err(self.base.invalid_id(id, "empty variant after ':'"));
        }
        self.base.check_known(id.to_string(), options)
    }

    fn build(&self, options: &BuildOptions) -> Result<Model> {
        self.base.build_model(self, options)
    }
}

fn builtin_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("anthropic/claude-3.5-sonnet")
            .named("Anthropic: Claude 3.5 Sonnet")
            .with_limit(200_000, 8_192)
            .with_architecture(Architecture::multimodal().with_tokenizer("Claude"))
            .with_tools(),
        ModelSpec::new("openai/gpt-4o")
            .named("OpenAI: GPT-4o")
            .with_limit(128_000, 16_384)
            .with_architecture(Architecture::multimodal().with_tokenizer("GPT"))
            .with_tools(),
        ModelSpec::new("google/gemini-2.0-flash-001")
            .named("Google: Gemini 2.0 Flash")
            .with_limit(1_048_576, 8_192)
            .with_architecture(Architecture::multimodal().with_tokenizer("Gemini"))
            .with_tools(),
        ModelSpec::new("meta-llama/llama-3.3-70b-instruct")
            .named("Meta: Llama 3.3 70B Instruct")
            .with_limit(131_072, 16_384)
            .with_architecture(Architecture::text().with_tokenizer("Llama3")),
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
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    context_length: Option<u64>,
    #[serde(default)]
    architecture: Option<ArchitectureEntry>,
    #[serde(default)]
    pricing: Option<Pricing>,
    #[serde(default)]
    top_provider: Option<TopProvider>,
    #[serde(default)]
    supported_parameters: Vec<String>,
}

#[derive(Deserialize)]
struct ArchitectureEntry {
    #[serde(default)]
    modality: Option<String>,
    #[serde(default)]
    tokenizer: Option<String>,
    #[serde(default)]
    instruct_type: Option<String>,
}

/// Prices are decimal strings in dollars per token.
#[derive(Deserialize)]
struct Pricing {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    completion: Option<String>,
}

#[derive(Deserialize)]
struct TopProvider {
    #[serde(default)]
    max_completion_tokens: Option<u64>,
}

fn per_million(price: Option<&str>) -> f64 {
    price
        .and_then(|p| p.parse::<f64>().ok())
        .map(|p| p * 1_000_000.0)
        .unwrap_or_default()
}

fn parse_listing(body: &[u8]) -> Result<Vec<ModelSpec>> {
    let list: ModelList = serde_json::from_slice(body)?;
    Ok(list
        .data
        .into_iter()
        .map(|entry| {
            let has = |param: &str| entry.supported_parameters.iter().any(|p| p == param);
            let tool_call = has("tools");
            let reasoning = has("reasoning");
            let output = entry
                .top_provider
                .as_ref()
                .and_then(|top| top.max_completion_tokens)
                .unwrap_or_default();
            ModelSpec {
                id: entry.id,
                name: entry.name,
                description: entry.description,
                reasoning,
                tool_call,
                architecture: entry.architecture.map(|arch| Architecture {
                    modality: arch.modality.unwrap_or_else(|| "text->text".into()),
                    tokenizer: arch.tokenizer,
                    instruct_type: arch.instruct_type,
                }),
                cost: entry.pricing.map(|pricing| ModelCost {
                    input: per_million(pricing.prompt.as_deref()),
                    output: per_million(pricing.completion.as_deref()),
                }),
                limit: entry
                    .context_length
                    .map(|context| ModelLimit { context, output }),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::test_keyring;

    #[test]
    fn normalize_requires_vendor_and_slug() {
        let adapter = OpenRouterAdapter::new(test_keyring(&[]));
        let plain = NormalizeOptions::default();

        assert_eq!(
            adapter.normalize("anthropic/claude-3.5-sonnet", &plain).unwrap(),
            "anthropic/claude-3.5-sonnet"
        );
        assert!(adapter.normalize("meta-llama/llama-3-8b:free", &plain).is_ok());
        for bad in ["claude-3.5-sonnet", "/gpt-4o", "openai/", "a/b/c", "openai/gpt-4o:"] {
            assert!(adapter.normalize(bad, &plain).is_err(), "{bad}");
        }
        assert!(adapter
            .normalize("openai/gpt-4o", &NormalizeOptions::strict())
            .is_ok());
    }

    #[test]
    fn attribution_headers_come_from_the_keyring() {
        let adapter = OpenRouterAdapter::new(test_keyring(&[
            ("openrouter_api_key", "sk-or"),
            ("OPENROUTER_SITE_URL", "https://example.com"),
            ("openrouter_app_name", "Demo"),
        ]));
        let headers = adapter.request_headers(&RequestOptions::new()).unwrap();
        assert_eq!(headers["authorization"], "Bearer sk-or");
        assert_eq!(headers["http-referer"], "https://example.com");
        assert_eq!(headers["x-title"], "Demo");
        assert_eq!(adapter.definition().kind, ProviderKind::Proxy);
    }

    #[test]
    fn listing_maps_pricing_and_limits() {
        let body = br#"{"data":[{
            "id":"openai/gpt-4o",
            "name":"OpenAI: GPT-4o",
            "context_length":128000,
            "architecture":{"modality":"text+image->text","tokenizer":"GPT","instruct_type":null},
            "pricing":{"prompt":"0.0000025","completion":"0.00001"},
            "top_provider":{"max_completion_tokens":16384},
            "supported_parameters":["tools","temperature"]
        }]}"#;
        let models = parse_listing(body).unwrap();
        let model = &models[0];
        assert!(model.tool_call);
        assert!(!model.reasoning);
        assert_eq!(
            model.limit,
            Some(ModelLimit {
                context: 128_000,
                output: 16_384
            })
        );
        let cost = model.cost.as_ref().unwrap();
        assert!((cost.input - 2.5).abs() < 1e-9);
        assert!((cost.output - 10.0).abs() < 1e-9);
        assert_eq!(model.architecture.as_ref().unwrap().tokenizer.as_deref(), Some("GPT"));
    }
}
