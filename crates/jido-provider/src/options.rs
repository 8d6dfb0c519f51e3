//! Typed options for adapter operations.
//!
//! Each struct carries a single `validate` entry point. Adapters call it
//! before doing any work, so range and shape errors surface as
//! [`Error::InvalidOptions`] regardless of provider.

use jido_keyring::ContextId;

use crate::error::{Error, Result};

/// Options for a single outbound request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Explicit API key. Takes precedence over the keyring.
    pub api_key: Option<String>,
    /// Override for the provider's base URL.
    pub base_url: Option<String>,
    /// Keyring context used to resolve credentials and settings.
    pub context: ContextId,
    /// Extra headers, applied after the provider's own.
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn context(mut self, context: ContextId) -> Self {
        self.context = context;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.base_url {
            validate_url(url)?;
        }
        if let Some((name, _)) = self.headers.iter().find(|(name, _)| name.trim().is_empty()) {
            return Err(Error::InvalidOptions(format!(
                "header name must not be empty (got '{name}')"
            )));
        }
        Ok(())
    }
}

/// Options for [`list_models`](crate::ProviderAdapter::list_models) and
/// [`model`](crate::ProviderAdapter::model).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelQuery {
    /// Fetch the provider's listing instead of using the cached or built-in
    /// catalog.
    pub refresh: bool,
    pub request: RequestOptions,
}

impl ModelQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query that fetches the live listing.
    pub fn refresh() -> Self {
        Self {
            refresh: true,
            ..Self::default()
        }
    }

    pub fn with_request(mut self, request: RequestOptions) -> Self {
        self.request = request;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.request.validate()
    }
}

/// Options for [`normalize`](crate::ProviderAdapter::normalize).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Also require the id to be present in the adapter's known models.
    pub strict: bool,
}

impl NormalizeOptions {
    pub fn strict() -> Self {
        Self { strict: true }
    }
}

/// Options for [`build`](crate::ProviderAdapter::build).
///
/// Only `model` is required. Everything else falls back to the provider's
/// defaults, the keyring, or the model catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildOptions {
    pub model: Option<String>,
    /// Display name. Defaults to the catalog name, then the id.
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub max_retries: Option<u32>,
    pub context: ContextId,
}

impl BuildOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    pub fn context(mut self, context: ContextId) -> Self {
        self.context = context;
        self
    }

    /// Check required fields and ranges. `provider` names the provider in
    /// the error for a missing model id.
    pub fn validate(&self, provider: &str) -> Result<()> {
        if self.model.as_deref().is_none_or(|m| m.trim().is_empty()) {
            return Err(Error::MissingModelId(provider.to_string()));
        }
        if let Some(t) = self.temperature
            && !(0.0..=2.0).contains(&t)
        {
            return Err(Error::InvalidOptions(format!(
                "temperature must be within 0.0..=2.0, got {t}"
            )));
        }
        if self.max_tokens == Some(0) {
            return Err(Error::InvalidOptions(
                "max_tokens must be greater than zero".into(),
            ));
        }
        if let Some(url) = &self.base_url {
            validate_url(url)?;
        }
        Ok(())
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::InvalidOptions(format!(
            "base_url must be an http(s) URL, got '{url}'"
        )))
    }
}
