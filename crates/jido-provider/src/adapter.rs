//! The provider adapter contract and the plumbing shared by its
//! implementations.

use std::sync::Arc;

use async_trait::async_trait;
use jido_keyring::{ContextId, Keyring};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info};

use crate::catalog::{ListingParser, ModelCatalog, fetch_listing};
use crate::definition::ProviderDefinition;
use crate::error::{Error, Result};
use crate::model::{DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, Model};
use crate::options::{BuildOptions, ModelQuery, NormalizeOptions, RequestOptions};
use crate::spec::ModelSpec;

/// A single LLM vendor API.
///
/// Callers work against this trait and the [`Model`] descriptor it builds;
/// adding a provider means implementing it and registering the adapter with
/// a [`ProviderRegistry`](crate::ProviderRegistry).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Static provider metadata.
    fn definition(&self) -> &ProviderDefinition;

    /// Headers for a request: content type, authorization derived from the
    /// resolved API key, provider-specific headers, then `options.headers`.
    fn request_headers(&self, options: &RequestOptions) -> Result<HeaderMap>;

    /// Available models, from the cache or built-in catalog unless
    /// `query.refresh` is set.
    async fn list_models(&self, query: &ModelQuery) -> Result<Vec<ModelSpec>>;

    /// Canonical form of `id` for this provider.
    fn normalize(&self, id: &str, options: &NormalizeOptions) -> Result<String>;

    /// Build a model descriptor. The API key comes from `options.api_key`,
    /// else from the keyring under the provider's key name.
    fn build(&self, options: &BuildOptions) -> Result<Model>;

    /// A single model's metadata.
    async fn model(&self, id: &str, query: &ModelQuery) -> Result<ModelSpec> {
        let id = self.normalize(id, &NormalizeOptions::default())?;
        self.list_models(query)
            .await?
            .into_iter()
            .find(|model| model.id == id)
            .ok_or_else(|| Error::ModelNotFound {
                provider: self.definition().id.to_string(),
                model: id,
            })
    }

    /// Base URL for requests: `explicit` when given, else the definition's.
    fn base_url(&self, explicit: Option<&str>, _context: ContextId) -> Result<String> {
        Ok(explicit
            .unwrap_or(self.definition().base_url)
            .trim_end_matches('/')
            .to_string())
    }
}

// ---------------------------------------------------------------------------
// Shared adapter state
// ---------------------------------------------------------------------------

/// State every built-in adapter carries: its definition, the keyring it
/// resolves credentials from, its model catalog and an HTTP client.
#[derive(Debug)]
pub struct AdapterBase {
    definition: ProviderDefinition,
    keyring: Arc<Keyring>,
    catalog: ModelCatalog,
    client: reqwest::Client,
}

impl AdapterBase {
    pub fn new(
        definition: ProviderDefinition,
        keyring: Arc<Keyring>,
        builtin: Vec<ModelSpec>,
    ) -> Self {
        Self {
            definition,
            keyring,
            catalog: ModelCatalog::new(builtin),
            client: reqwest::Client::new(),
        }
    }

    pub fn definition(&self) -> &ProviderDefinition {
        &self.definition
    }

    pub fn keyring(&self) -> &Arc<Keyring> {
        &self.keyring
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// An explicit non-empty key wins; otherwise the keyring value for the
    /// provider's key name, as seen from `context`.
    pub fn resolve_api_key(&self, explicit: Option<&str>, context: ContextId) -> Option<String> {
        match explicit {
            Some(key) if !key.is_empty() => Some(key.to_string()),
            _ => self
                .keyring
                .get_string(self.definition.api_key_name, context),
        }
    }

    /// Build the header map. `auth` adds the provider's authorization
    /// headers given the resolved key.
    pub fn headers<F>(&self, options: &RequestOptions, auth: F) -> Result<HeaderMap>
    where
        F: FnOnce(&mut HeaderMap, &str) -> Result<()>,
    {
        options.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match self.resolve_api_key(options.api_key.as_deref(), options.context) {
            Some(key) => auth(&mut headers, &key)?,
            None if self.definition.requires_api_key => {
                return Err(Error::MissingApiKey {
                    provider: self.definition.id.to_string(),
                    key: self.definition.api_key_name.to_string(),
                });
            }
            None => {}
        }

        for (name, value) in &options.headers {
            insert_header(&mut headers, name, value)?;
        }
        Ok(headers)
    }

    /// Shared `list_models`: the catalog, or a fetch of `path` under the
    /// adapter's base URL when `query.refresh` is set.
    pub async fn list_models(
        &self,
        adapter: &dyn ProviderAdapter,
        query: &ModelQuery,
        path: &str,
        parse: ListingParser,
    ) -> Result<Vec<ModelSpec>> {
        query.validate()?;
        if !query.refresh {
            return Ok(self.catalog.models());
        }
        let request = &query.request;
        let base_url = adapter.base_url(request.base_url.as_deref(), request.context)?;
        let headers = adapter.request_headers(request)?;
        self.refresh(&format!("{base_url}{path}"), headers, parse).await
    }

    /// Shared `build`: validate, normalize the model id, resolve the base
    /// URL and assemble the descriptor.
    pub fn build_model(
        &self,
        adapter: &dyn ProviderAdapter,
        options: &BuildOptions,
    ) -> Result<Model> {
        options.validate(self.definition.id)?;
        let requested = options.model.as_deref().unwrap_or_default();
        let id = adapter.normalize(requested, &NormalizeOptions::default())?;
        let base_url = adapter.base_url(options.base_url.as_deref(), options.context)?;
        Ok(self.build(options, id, base_url))
    }

    /// Trim `id` and reject empty ids or ids with inner whitespace.
    pub fn clean_id<'a>(&self, id: &'a str) -> Result<&'a str> {
        let id = id.trim();
        if id.is_empty() {
            return Err(self.invalid_id(id, "model id is empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(self.invalid_id(id, "model id contains whitespace"));
        }
        Ok(id)
    }

    /// Fetch the listing at `url`, store it in the catalog and return it.
    pub async fn refresh(
        &self,
        url: &str,
        headers: HeaderMap,
        parse: ListingParser,
    ) -> Result<Vec<ModelSpec>> {
        let models = fetch_listing(&self.client, url, headers, parse).await?;
        info!(
            provider = self.definition.id,
            count = models.len(),
            "model catalog refreshed"
        );
        self.catalog.store(models.clone());
        Ok(models)
    }

    /// Reject ids missing from the catalog when `options.strict` is set.
    pub fn check_known(&self, id: String, options: &NormalizeOptions) -> Result<String> {
        if options.strict && !self.catalog.contains(&id) {
            return Err(Error::InvalidModelId {
                provider: self.definition.id.to_string(),
                id,
                reason: "not a known model".into(),
            });
        }
        Ok(id)
    }

    pub fn invalid_id(&self, id: &str, reason: impl Into<String>) -> Error {
        Error::InvalidModelId {
            provider: self.definition.id.to_string(),
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Assemble the descriptor for an already-normalized `id`, filling gaps
    /// from the catalog and the defaults.
    pub fn build(&self, options: &BuildOptions, id: String, base_url: String) -> Model {
        let spec = self.catalog.find(&id);
        let name = options
            .name
            .clone()
            .or_else(|| spec.as_ref().and_then(|s| s.name.clone()))
            .unwrap_or_else(|| id.clone());
        let api_key = self.resolve_api_key(options.api_key.as_deref(), options.context);
        if api_key.is_none() && self.definition.requires_api_key {
            debug!(
                provider = self.definition.id,
                key = self.definition.api_key_name,
                "building model without an API key"
            );
        }

        Model {
            name,
            provider: self.definition.id.to_string(),
            api_key,
            base_url,
            temperature: options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_retries: options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            architecture: spec
                .as_ref()
                .and_then(|s| s.architecture.clone())
                .unwrap_or_default(),
            description: spec.as_ref().and_then(|s| s.description.clone()),
            context_length: spec.as_ref().and_then(|s| s.limit).map(|l| l.context),
            id,
        }
    }
}

/// Insert a header from string parts, mapping invalid names or values to
/// [`Error::InvalidHeader`].
pub fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
    let value =
        HeaderValue::from_str(value).map_err(|e| Error::InvalidHeader(format!("{name}: {e}")))?;
    headers.insert(name, value);
    Ok(())
}

/// `Authorization: Bearer <key>`.
pub fn bearer(headers: &mut HeaderMap, key: &str) -> Result<()> {
    insert_header(headers, "authorization", &format!("Bearer {key}"))
}
