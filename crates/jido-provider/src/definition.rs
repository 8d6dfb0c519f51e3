//! Static provider metadata.

use std::fmt;

use serde::Serialize;

/// How a provider relates to the models it serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// The vendor's own API.
    Direct,
    /// A gateway routing to models from several vendors.
    Proxy,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Direct => "direct",
            ProviderKind::Proxy => "proxy",
        })
    }
}

/// Identity and endpoint of a provider. Fixed for the adapter's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderDefinition {
    /// Provider identifier, e.g. `"anthropic"`.
    pub id: &'static str,
    /// Display name, e.g. `"Anthropic"`.
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ProviderKind,
    /// Base API URL, without a trailing slash.
    pub base_url: &'static str,
    pub requires_api_key: bool,
    /// Keyring key holding the API key, e.g. `"anthropic_api_key"`.
    pub api_key_name: &'static str,
}
