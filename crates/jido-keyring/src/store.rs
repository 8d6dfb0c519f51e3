//! The keyring: a read-only base mapping plus per-context session overrides.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::app_config::AppConfig;
use crate::env;
use crate::error::{Error, Result};
use crate::instances;
use crate::key::{ContextId, LIVEBOOK_PREFIX, normalize_key};
use crate::session::{Session, SessionGuard};

/// Name used when no instance name is given.
pub const DEFAULT_NAME: &str = "jido_keyring";

/// Startup options for a [`Keyring`].
#[derive(Debug, Clone)]
pub struct KeyringOptions {
    pub name: String,
    /// Label of the override table. Defaults to `"<name>_overrides"`.
    pub table_name: Option<String>,
    /// Directory holding `.env`, `.<env>.env` and `.<env>.overrides.env`.
    pub env_dir: PathBuf,
    /// Environment tag used to pick env files. `None` reads `JIDO_ENV` /
    /// `APP_ENV` and falls back to `"dev"`.
    pub environment: Option<String>,
    /// Whether OS environment variables are layered over the env files.
    pub include_process_env: bool,
    pub app_config: AppConfig,
    /// Compiled-in defaults, lowest precedence.
    pub defaults: Map<String, Value>,
}

impl Default for KeyringOptions {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            table_name: None,
            env_dir: PathBuf::from("envs"),
            environment: None,
            include_process_env: true,
            app_config: AppConfig::default(),
            defaults: Map::new(),
        }
    }
}

impl KeyringOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn table_name(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    pub fn env_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.env_dir = dir.into();
        self
    }

    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn include_process_env(mut self, include: bool) -> Self {
        self.include_process_env = include;
        self
    }

    pub fn app_config(mut self, config: AppConfig) -> Self {
        self.app_config = config;
        self
    }

    pub fn default_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }
}

/// Hierarchical configuration store.
///
/// Lookups resolve in this order:
/// 1. the session override for `(context, key)`,
/// 2. the base mapping (env > app config > defaults, merged at startup),
/// 3. the base value of the Livebook-prefixed key `lb_<key>`,
/// 4. the caller's default.
///
/// The base mapping never changes after startup. Overrides live in a
/// sharded concurrent map keyed by [`ContextId`], so contexts never block or
/// observe each other.
pub struct Keyring {
    name: String,
    table_name: String,
    base: HashMap<String, Value>,
    overrides: DashMap<ContextId, HashMap<String, Value>>,
}

impl Keyring {
    /// Load a keyring and register it under `options.name`.
    ///
    /// Fails if an instance with that name is already running, or if any
    /// configuration source is malformed.
    pub fn start(options: KeyringOptions) -> Result<Arc<Keyring>> {
        if instances::instance(&options.name).is_some() {
            return Err(Error::AlreadyStarted(options.name));
        }
        let keyring = Arc::new(Self::load(options)?);
        instances::register(keyring)
    }

    /// Load a keyring without registering it.
    pub fn load(options: KeyringOptions) -> Result<Keyring> {
        let environment = options
            .environment
            .clone()
            .unwrap_or_else(env::default_environment);

        let mut base = HashMap::new();
        for (name, value) in &options.defaults {
            let key = normalize_key(name);
            if !key.is_empty() {
                base.insert(key, value.clone());
            }
        }
        base.extend(options.app_config.flatten());
        base.extend(env::load_env_sources(
            &options.env_dir,
            &environment,
            options.include_process_env,
        )?);

        let table_name = options
            .table_name
            .unwrap_or_else(|| format!("{}_overrides", options.name));

        info!(
            name = %options.name,
            table = %table_name,
            environment = %environment,
            keys = base.len(),
            "keyring started"
        );

        Ok(Self {
            name: options.name,
            table_name,
            base,
            overrides: DashMap::new(),
        })
    }

    /// Build a keyring directly from an already-resolved base mapping.
    pub fn from_base(name: impl Into<String>, base: HashMap<String, Value>) -> Keyring {
        let name = name.into();
        let base = base
            .into_iter()
            .map(|(k, v)| (normalize_key(&k), v))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self {
            table_name: format!("{name}_overrides"),
            name,
            base,
            overrides: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Resolve `key` for `context`: session override first, then the base
    /// mapping. `None` when neither holds a value.
    pub fn get(&self, key: &str, context: ContextId) -> Option<Value> {
        let key = normalize_key(key);
        if key.is_empty() {
            return None;
        }
        if let Some(value) = self.override_value(&key, context) {
            return Some(value);
        }
        self.base_value(&key).cloned()
    }

    /// Like [`get`](Self::get) with a fallback for absent keys.
    pub fn get_or(&self, key: &str, default: impl Into<Value>, context: ContextId) -> Value {
        self.get(key, context).unwrap_or_else(|| default.into())
    }

    /// Resolve `key` as a usable string: present only when the effective
    /// value [`has_value`].
    pub fn get_string(&self, key: &str, context: ContextId) -> Option<String> {
        match self.get(key, context)? {
            Value::String(s) if !s.is_empty() => Some(s),
            _ => None,
        }
    }

    /// Read the base mapping only, ignoring every override.
    pub fn get_base(&self, key: &str) -> Option<Value> {
        let key = normalize_key(key);
        if key.is_empty() {
            return None;
        }
        self.base_value(&key).cloned()
    }

    pub fn get_base_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get_base(key).unwrap_or_else(|| default.into())
    }

    /// Whether `key` resolves to a non-empty string for `context`.
    pub fn has(&self, key: &str, context: ContextId) -> bool {
        self.get(key, context).as_ref().is_some_and(has_value)
    }

    /// All keys in the base mapping, sorted. Overrides are not included.
    pub fn list_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.base.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn base_value(&self, key: &str) -> Option<&Value> {
        self.base
            .get(key)
            .or_else(|| self.base.get(&format!("{LIVEBOOK_PREFIX}{key}")))
    }

    // -----------------------------------------------------------------------
    // Session overrides
    // -----------------------------------------------------------------------

    /// Insert or replace the override for `(context, key)`.
    ///
    /// Visible to `context` as soon as this returns.
    pub fn set_override(
        &self,
        key: &str,
        value: impl Into<Value>,
        context: ContextId,
    ) -> Result<()> {
        let normalized = normalize_key(key);
        if normalized.is_empty() {
            return Err(Error::InvalidKey(key.to_string()));
        }
        debug!(keyring = %self.name, %context, key = %normalized, "set override");
        self.overrides
            .entry(context)
            .or_default()
            .insert(normalized, value.into());
        Ok(())
    }

    /// The override for `(context, key)`, or `None` when no override exists.
    ///
    /// An override explicitly set to `null` is returned as
    /// `Some(Value::Null)`.
    pub fn get_override(&self, key: &str, context: ContextId) -> Option<Value> {
        let key = normalize_key(key);
        self.override_value(&key, context)
    }

    /// Remove the override for `(context, key)`. Clearing an absent override
    /// is a no-op.
    pub fn clear_override(&self, key: &str, context: ContextId) {
        let key = normalize_key(key);
        let removed = match self.overrides.get_mut(&context) {
            Some(mut table) => table.remove(&key).is_some(),
            None => false,
        };
        self.overrides.remove_if(&context, |_, table| table.is_empty());
        if removed {
            debug!(keyring = %self.name, %context, key = %key, "cleared override");
        }
    }

    /// Remove every override owned by `context`. Other contexts and the base
    /// mapping are untouched.
    pub fn clear_all_overrides(&self, context: ContextId) {
        if let Some((_, table)) = self.overrides.remove(&context) {
            debug!(keyring = %self.name, %context, count = table.len(), "cleared all overrides");
        }
    }

    /// Total number of overrides across all contexts.
    pub fn override_count(&self) -> usize {
        self.overrides.iter().map(|entry| entry.value().len()).sum()
    }

    /// Contexts currently holding at least one override.
    pub fn contexts(&self) -> Vec<ContextId> {
        let mut contexts: Vec<ContextId> = self.overrides.iter().map(|e| *e.key()).collect();
        contexts.sort();
        contexts
    }

    fn override_value(&self, key: &str, context: ContextId) -> Option<Value> {
        self.overrides.get(&context)?.get(key).cloned()
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// A handle bound to `context`.
    pub fn session(self: &Arc<Self>, context: ContextId) -> Session {
        Session::new(Arc::clone(self), context)
    }

    /// A handle bound to a fresh context whose overrides are cleared when
    /// the guard is dropped.
    pub fn scoped_session(self: &Arc<Self>) -> SessionGuard {
        SessionGuard::new(self.session(ContextId::new()))
    }

    /// Read an OS environment variable verbatim, bypassing the keyring.
    pub fn get_env_var(name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("keys", &self.base.len())
            .field("overrides", &self.override_count())
            .finish()
    }
}

/// True only for non-empty strings.
///
/// Credentials that are set but empty count as not configured.
pub fn has_value(value: &Value) -> bool {
    matches!(value, Value::String(s) if !s.is_empty())
}
