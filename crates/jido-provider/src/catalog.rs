//! Per-adapter model catalog: a built-in list plus a refreshable cache.

use parking_lot::RwLock;
use reqwest::header::HeaderMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::spec::ModelSpec;

/// Decodes a provider's model listing response body.
pub type ListingParser = fn(&[u8]) -> Result<Vec<ModelSpec>>;

/// Models known to one adapter.
///
/// Reads return the last fetched listing when there is one, otherwise the
/// built-in list compiled into the adapter.
#[derive(Debug)]
pub struct ModelCatalog {
    builtin: Vec<ModelSpec>,
    cache: RwLock<Option<Vec<ModelSpec>>>,
}

impl ModelCatalog {
    pub fn new(builtin: Vec<ModelSpec>) -> Self {
        Self {
            builtin,
            cache: RwLock::new(None),
        }
    }

    pub fn models(&self) -> Vec<ModelSpec> {
        match &*self.cache.read() {
            Some(models) => models.clone(),
            None => self.builtin.clone(),
        }
    }

    pub fn find(&self, id: &str) -> Option<ModelSpec> {
        let cache = self.cache.read();
        cache
            .as_deref()
            .unwrap_or(&self.builtin)
            .iter()
            .find(|model| model.id == id)
            .cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        let cache = self.cache.read();
        cache
            .as_deref()
            .unwrap_or(&self.builtin)
            .iter()
            .any(|model| model.id == id)
    }

    /// Replace the cached listing.
    pub fn store(&self, models: Vec<ModelSpec>) {
        *self.cache.write() = Some(models);
    }

    pub fn is_cached(&self) -> bool {
        self.cache.read().is_some()
    }

    /// Drop the cached listing and fall back to the built-in list.
    pub fn clear(&self) {
        *self.cache.write() = None;
    }
}

/// GET `url` and decode the body with `parse`.
///
/// Non-success statuses become [`Error::Api`] carrying the response body.
pub(crate) async fn fetch_listing(
    client: &reqwest::Client,
    url: &str,
    headers: HeaderMap,
    parse: ListingParser,
) -> Result<Vec<ModelSpec>> {
    debug!(url, "fetching model listing");
    let response = client.get(url).headers(headers).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(url, status = status.as_u16(), "model listing request failed");
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }

    let body = response.bytes().await?;
    let models = parse(&body)?;
    debug!(url, count = models.len(), "model listing fetched");
    Ok(models)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_shadows_builtin_until_cleared() {
        let catalog = ModelCatalog::new(vec![ModelSpec::new("a"), ModelSpec::new("b")]);
        assert!(catalog.contains("a"));
        assert!(!catalog.is_cached());

        catalog.store(vec![ModelSpec::new("c")]);
        assert!(catalog.is_cached());
        assert!(!catalog.contains("a"));
        assert_eq!(catalog.find("c"), Some(ModelSpec::new("c")));

        catalog.clear();
        assert_eq!(catalog.models().len(), 2);
    }
}
