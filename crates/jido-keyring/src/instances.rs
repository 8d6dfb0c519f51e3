//! Process-wide registry of named keyring instances.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::info;

use crate::error::{Error, Result};
use crate::store::{DEFAULT_NAME, Keyring};

static INSTANCES: LazyLock<RwLock<HashMap<String, Arc<Keyring>>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

pub(crate) fn register(keyring: Arc<Keyring>) -> Result<Arc<Keyring>> {
    let mut instances = INSTANCES.write();
    if instances.contains_key(keyring.name()) {
        return Err(Error::AlreadyStarted(keyring.name().to_string()));
    }
    instances.insert(keyring.name().to_string(), Arc::clone(&keyring));
    Ok(keyring)
}

/// Look up a running keyring by name.
pub fn instance(name: &str) -> Option<Arc<Keyring>> {
    INSTANCES.read().get(name).cloned()
}

/// The keyring started under [`DEFAULT_NAME`], if any.
pub fn default_instance() -> Option<Arc<Keyring>> {
    instance(DEFAULT_NAME)
}

/// Unregister a keyring. Handles already held stay usable.
pub fn stop(name: &str) -> Option<Arc<Keyring>> {
    let stopped = INSTANCES.write().remove(name);
    if stopped.is_some() {
        info!(name, "keyring stopped");
    }
    stopped
}

/// Names of all running keyrings, sorted.
pub fn running() -> Vec<String> {
    let mut names: Vec<String> = INSTANCES.read().keys().cloned().collect();
    names.sort();
    names
}
