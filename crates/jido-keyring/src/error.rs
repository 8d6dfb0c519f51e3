use std::path::PathBuf;

/// Errors produced while starting or mutating a keyring.
///
/// Missing keys are never errors; lookups fall back to a default instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An env file exists but could not be parsed.
    #[error("malformed env file {}: {source}", path.display())]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// A configuration file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Application configuration could not be parsed.
    #[error("app config parse error: {0}")]
    AppConfig(#[from] serde_yaml::Error),

    /// Application configuration parsed but has the wrong shape.
    #[error("invalid app config: {0}")]
    InvalidAppConfig(String),

    /// A key normalizes to nothing (empty or only punctuation).
    #[error("invalid config key: {0:?}")]
    InvalidKey(String),

    /// A keyring with this name is already running.
    #[error("keyring already started: {0}")]
    AlreadyStarted(String),
}

pub type Result<T> = std::result::Result<T, Error>;
