/// Errors produced by provider adapters and the provider registry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The provider needs an API key and none was given or configured.
    #[error("no API key configured for provider '{provider}' (expected keyring key '{key}')")]
    MissingApiKey { provider: String, key: String },

    /// A model id could not be normalized to the provider's canonical form.
    #[error("invalid model id '{id}' for provider '{provider}': {reason}")]
    InvalidModelId {
        provider: String,
        id: String,
        reason: String,
    },

    /// `build` was called without a model id.
    #[error("a model id is required to build a '{0}' model")]
    MissingModelId(String),

    /// Option values out of range.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("model not found: {provider}:{model}")]
    ModelNotFound { provider: String, model: String },

    #[error("provider not found: {0}")]
    ProviderNotFound(String),

    /// A model specifier is not of the form `provider:model`.
    #[error("invalid model specifier '{0}', expected 'provider:model'")]
    InvalidSpecifier(String),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("api error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("json error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
