//! # jido-keyring
//!
//! Hierarchical configuration and credential resolution for LLM clients.
//!
//! A [`Keyring`] holds two tiers:
//!
//! - a **base mapping**, merged once at startup from compiled-in defaults,
//!   application config and environment sources (`.env` files and the OS
//!   environment, later sources winning), and
//! - **session overrides**, scoped to an explicit [`ContextId`] so that one
//!   caller can swap an API key without affecting anyone else.
//!
//! ```ignore
//! use jido_keyring::{ContextId, Keyring, KeyringOptions};
//!
//! let keyring = Keyring::start(KeyringOptions::default())?;
//! let ctx = ContextId::new();
//!
//! keyring.set_override("openai_api_key", "sk-test", ctx)?;
//! assert_eq!(keyring.get_string("openai_api_key", ctx).as_deref(), Some("sk-test"));
//! ```

pub mod app_config;
mod env;
pub mod error;
mod instances;
mod key;
mod session;
mod store;

pub use app_config::{AppConfig, DEFAULT_NAMESPACE};
pub use error::{Error, Result};
pub use instances::{default_instance, instance, running, stop};
pub use key::{ContextId, normalize_key};
pub use session::{Session, SessionGuard};
pub use store::{DEFAULT_NAME, Keyring, KeyringOptions, has_value};

pub use serde_json::Value;
