//! Key normalization and requester identities.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix Livebook adds to secrets it exports as environment variables.
pub(crate) const LIVEBOOK_PREFIX: &str = "lb_";

/// Normalize a source key to its canonical lookup form.
///
/// Lower-cases the key and collapses every run of non-alphanumeric
/// characters into a single `_`. Leading and trailing separators are
/// dropped, so `"OPENAI_API_KEY"`, `"openai-api-key"` and
/// `"  Openai.Api.Key "` all become `"openai_api_key"`.
pub fn normalize_key(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;

    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Identity of the calling context that owns a set of session overrides.
///
/// Overrides are always scoped to a `ContextId`; two contexts never see each
/// other's overrides. [`ContextId::ROOT`] is the shared default context used
/// by callers that have no identity of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(u64);

static NEXT_CONTEXT: AtomicU64 = AtomicU64::new(1);

impl ContextId {
    pub const ROOT: ContextId = ContextId(0);

    /// Allocate a fresh, process-unique context id.
    pub fn new() -> Self {
        Self(NEXT_CONTEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_env_style_names() {
        assert_eq!(normalize_key("OPENAI_API_KEY"), "openai_api_key");
        assert_eq!(normalize_key("openai-api-key"), "openai_api_key");
        assert_eq!(normalize_key("  Openai.Api..Key "), "openai_api_key");
        assert_eq!(normalize_key("__LB__ANTHROPIC_API_KEY__"), "lb_anthropic_api_key");
    }

    #[test]
    fn punctuation_only_keys_normalize_to_empty() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key("-._ "), "");
    }

    #[test]
    fn fresh_contexts_are_distinct_from_root() {
        let a = ContextId::new();
        let b = ContextId::new();
        assert_ne!(a, b);
        assert_ne!(a, ContextId::ROOT);
        assert_eq!(ContextId::default(), ContextId::ROOT);
    }
}
