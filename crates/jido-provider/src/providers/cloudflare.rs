//! Cloudflare Workers AI.
//!
//! Requests go to an account-scoped endpoint, so the base URL is resolved
//! per call from the `cloudflare_account_id` keyring entry.

use std::sync::Arc;

use async_trait::async_trait;
use jido_keyring::{ContextId, Keyring};
use reqwest::header::HeaderMap;
use serde::Deserialize;

use crate::adapter::{AdapterBase, ProviderAdapter, bearer, insert_header};
use crate::definition::{ProviderDefinition, ProviderKind};
use crate::error::{Error, Result};
use crate::model::Model;
use crate::options::{BuildOptions, ModelQuery, NormalizeOptions, RequestOptions};
use crate::spec::{Architecture, ModelSpec};

pub const DEFINITION: ProviderDefinition = ProviderDefinition {
    id: "cloudflare",
    name: "Cloudflare Workers AI",
    description: "Open models served from Cloudflare's edge network",
    kind: ProviderKind::Proxy,
    base_url: "https://api.cloudflare.com/client/v4/accounts",
    requires_api_key: true,
    api_key_name: "cloudflare_api_key",
};

pub const ACCOUNT_ID_KEY: &str = "cloudflare_account_id";
/// Keyring key for the optional `X-Auth-Email` header.
pub const EMAIL_KEY: &str = "cloudflare_email";

const NAMESPACES: &[&str] = &["@cf/", "@hf/"];

#[derive(Debug)]
pub struct CloudflareAdapter {
    base: AdapterBase,
}

impl CloudflareAdapter {
    pub fn new(keyring: Arc<Keyring>) -> Self {
        Self {
            base: AdapterBase::new(DEFINITION, keyring, builtin_models()),
        }
    }
}

#[async_trait]
impl ProviderAdapter for CloudflareAdapter {
    fn definition(&self) -> &ProviderDefinition {
        self.base.definition()
    }

    fn request_headers(&self, options: &RequestOptions) -> Result<HeaderMap> {
        let email = self.base.keyring().get_string(EMAIL_KEY, options.context);
        self.base.headers(options, |headers, key| {
            bearer(headers, key)?;
            if let Some(email) = &email {
                insert_header(headers, "x-auth-email", email)?;
            }
            Ok(())
        })
    }

    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSpec>> {
        self.base
            .list_models(self, query, "/models/search", parse_listing)
            .await
    }

    /// Ids are `@cf/vendor/model` or `@hf/vendor/model`. A bare
    /// `vendor/model` is placed in the `@cf/` namespace.
    fn normalize(&self, id: &str, options: &NormalizeOptions) -> Result<String> {
        let id = self.base.clean_id(id)?;
        let (namespace, path) = match NAMESPACES
            .iter()
            .find_map(|ns| id.strip_prefix(ns).map(|rest| (*ns, rest)))
        {
            Some(found) => found,
            None if id.starts_with('@') => {
                return Err(self
                    .base
                    .invalid_id(id, "namespace must be '@cf/' or '@hf/'"));
            }
            None => ("@cf/", id),
        };

        match path.split_once('/') {
            Some((vendor, model)) if !vendor.is_empty() && !model.is_empty() => {
                self.base.check_known(format!("{namespace}{path}"), options)
            }
            _ => Err(self.base.invalid_id(id, "expected '@cf/vendor/model'")),
        }
    }

    fn build(&self, options: &BuildOptions) -> Result<Model> {
        self.base.build_model(self, options)
    }

    fn base_url(&self, explicit: Option<&str>, context: ContextId) -> Result<String> {
        if let Some(url) = explicit {
            return Ok(url.trim_end_matches('/').to_string());
        }
        let account = self
            .base
            .keyring()
            .get_string(ACCOUNT_ID_KEY, context)
            .ok_or_else(|| {
                Error::InvalidOptions(format!(
                    "'{ACCOUNT_ID_KEY}' must be configured to reach Cloudflare Workers AI"
                ))
            })?;
        Ok(format!("{}/{account}/ai", DEFINITION.base_url))
    }
}

fn builtin_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new("@cf/meta/llama-3.1-8b-instruct")
            .named("Llama 3.1 8B Instruct")
            .with_limit(7_968, 2_048)
            .with_architecture(Architecture::text().with_tokenizer("Llama3")),
        ModelSpec::new("@cf/meta/llama-3.3-70b-instruct-fp8-fast")
            .named("Llama 3.3 70B Instruct (fp8)")
            .with_limit(24_000, 4_096)
            .with_architecture(Architecture::text().with_tokenizer("Llama3"))
            .with_tools(),
        ModelSpec::new("@cf/mistral/mistral-7b-instruct-v0.1")
            .named("Mistral 7B Instruct")
            .with_limit(2_824, 2_048)
            .with_architecture(Architecture::text().with_tokenizer("Mistral")),
        ModelSpec::new("@hf/google/gemma-7b-it")
            .named("Gemma 7B IT")
            .with_limit(8_192, 2_048)
            .with_architecture(Architecture::text().with_tokenizer("Gemma")),
    ]
}

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    task: Option<Task>,
}

#[derive(Deserialize)]
struct Task {
    name: String,
}

fn parse_listing(body: &[u8]) -> Result<Vec<ModelSpec>> {
    let response: SearchResponse = serde_json::from_slice(body)?;
    Ok(response
        .result
        .into_iter()
        .filter(|entry| {
            entry
                .task
                .as_ref()
                .is_none_or(|task| task.name == "Text Generation")
        })
        .map(|entry| ModelSpec {
            description: entry.description,
            architecture: Some(Architecture::text()),
            ..ModelSpec::new(entry.name)
        })
        .collect())
}
