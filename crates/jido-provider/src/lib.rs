//! # jido-provider
//!
//! A uniform contract over LLM vendor APIs. Each provider implements
//! [`ProviderAdapter`]: it describes itself, builds request headers, lists
//! its models, normalizes model ids and builds a provider-agnostic
//! [`Model`] descriptor. Credentials are resolved through a
//! [`jido_keyring::Keyring`], so session overrides apply per context.
//!
//! Built-in adapters cover Anthropic, OpenAI, OpenRouter, Cloudflare
//! Workers AI and Google Gemini. [`ProviderRegistry`] maps provider ids to
//! adapters and resolves `"provider:model"` strings.

pub mod adapter;
pub mod catalog;
pub mod definition;
pub mod error;
pub mod model;
pub mod options;
pub mod providers;
pub mod registry;
pub mod spec;

pub use adapter::{AdapterBase, ProviderAdapter};
pub use catalog::ModelCatalog;
pub use definition::{ProviderDefinition, ProviderKind};
pub use error::{Error, Result};
pub use model::Model;
pub use options::{BuildOptions, ModelQuery, NormalizeOptions, RequestOptions};
pub use registry::ProviderRegistry;
pub use spec::{Architecture, ModelCost, ModelLimit, ModelSpec};
