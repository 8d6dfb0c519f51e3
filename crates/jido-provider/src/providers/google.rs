//! Google Gemini API.

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
use crate::spec::{Architecture, ModelLimit, ModelSpec};

pub const DEFINITION: ProviderDefinition = ProviderDefinition {
    id: "google",
    name: "Google",
    description: "Gemini models through the Generative Language API",
    kind: ProviderKind::Direct,
    base_url: "https://generativelanguage.googleapis.com/v1beta",
    requires_api_key: true,
    api_key_name: "google_api_key",
};

#[derive(Debug)]
pub struct GoogleAdapter {
    base: AdapterBase,
}

impl GoogleAdapter {
    pub fn new(keyring: Arc<Keyring>) -> Self {
        Self {
            base: AdapterBase::new(DEFINITION, keyring, builtin_models()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn definition(&self) -> &ProviderDefinition {
        self.base.definition()
    }

    fn request_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        self.base
            .headers(options, |headers, key| insert_header(headers, "x-goog-api-key", key))
    }

    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSpec>> {
        self.base
            .list_models(self, query, "/models", parse_listing)
            .await
    }

    fn normalize(&self, id: &str, options: &NormalizeOptions) -> Result<String> {
        let id = self.base.clean_id(id)?;
        let id = id.strip_prefix("models/").unwrap_or(id);
        let id = id.strip_prefix("google/").unwrap_or(id);
        if !id.starts_with("gemini-") {
            return Err(self
                .base
                .invalid_id(id, "Gemini model ids start with 'gemini-'"));
        }
        self.base.check_known(id.to_string(), options)
    }

    fn build(&self, options: &BuildOptions) -> Result<Model> {
        self.base.build_model(self, options)
    }
}

fn builtin_models() -> Vec<ModelSpec> {
    let gemini = |id: &str, name: &str, context: u64| {
        ModelSpec::new(id)
            .named(name)
            .with_limit(context, 8_192)
            .with_architecture(Architecture::multimodal().with_tokenizer("Gemini"))
            .with_tools()
    };
    vec![
        gemini("gemini-1.5-flash", "Gemini 1.5 Flash", 1_048_576),
        gemini("gemini-1.5-pro", "Gemini 1.5 Pro", 2_097_152),
        gemini("gemini-2.0-flash", "Gemini 2.0 Flash", 1_048_576),
        gemini("gemini-2.5-pro", "Gemini 2.5 Pro", 1_048_576).with_reasoning(),
    ]
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelEntry {
    /// `models/<id>`.
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    input_token_limit: Option<u64>,
    #[serde(default)]
    output_token_limit: Option<u64>,
}

fn parse_listing(body: &[u8]) -> Result<Vec<ModelSpec>> {
    let list: ModelList = serde_json::from_slice(body)?;
    Ok(list
        .models
        .into_iter()
        .map(|entry| {
            let id = entry
                .name
                .strip_prefix("models/")
                .unwrap_or(&entry.name)
                .to_string();
            ModelSpec {
                name: entry.display_name,
                description: entry.description,
                architecture: Some(Architecture::multimodal().with_tokenizer("Gemini")),
                limit: entry.input_token_limit.map(|context| ModelLimit {
                    context,
                    output: entry.output_token_limit.unwrap_or_default(),
                }),
                ..ModelSpec::new(id)
            }
        })
        .collect())
}
