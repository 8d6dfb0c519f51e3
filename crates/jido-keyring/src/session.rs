//! Context-bound handles over a [`Keyring`].

use std::ops::Deref;
use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;
use crate::key::ContextId;
use crate::store::Keyring;

/// A keyring handle bound to one [`ContextId`].
///
/// Every operation reads and writes that context's overrides, so callers do
/// not thread the context through each call.
#[derive(Debug, Clone)]
pub struct Session {
    keyring: Arc<Keyring>,
    context: ContextId,
}

impl Session {
    pub fn new(keyring: Arc<Keyring>, context: ContextId) -> Self {
        Self { keyring, context }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn keyring(&self) -> &Arc<Keyring> {
        &self.keyring
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.keyring.get(key, self.context)
    }

    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.keyring.get_or(key, default, self.context)
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.keyring.get_string(key, self.context)
    }

    pub fn has(&self, key: &str) -> bool {
        self.keyring.has(key, self.context)
    }

    pub fn get_override(&self, key: &str) -> Option<Value> {
        self.keyring.get_override(key, self.context)
    }

    pub fn set_override(&self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.keyring.set_override(key, value, self.context)
    }

    pub fn clear_override(&self, key: &str) {
        self.keyring.clear_override(key, self.context)
    }

    pub fn clear_all_overrides(&self) {
        self.keyring.clear_all_overrides(self.context)
    }
}

/// A [`Session`] that clears all of its overrides when dropped.
#[derive(Debug)]
pub struct SessionGuard {
    session: Session,
}

impl SessionGuard {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.session.clear_all_overrides();
    }
}
