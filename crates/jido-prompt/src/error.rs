use crate::message::Role;

/// A prompt failed structural validation. The operation that produced it
/// was rejected and no prompt value was changed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A system message appears somewhere other than position 0.
    #[error("system message must be first, found one at index {index}")]
    SystemNotFirst { index: usize },

    /// More than one system message.
    #[error("only one system message is allowed")]
    MultipleSystem,

    /// Unknown template engine tag.
    #[error("unsupported template engine: {0}")]
    UnsupportedEngine(String),

    /// Unknown message role.
    #[error("unsupported message role: {0}")]
    UnsupportedRole(String),

    /// Function messages must carry the function name.
    #[error("function message at index {index} has no name")]
    MissingFunctionName { index: usize },

    /// Versions start at 1.
    #[error("prompt versions start at 1, got {0}")]
    InvalidVersion(u32),

    /// History entries must be strictly older than the entry before them.
    #[error("history version {version} must be lower than {previous}")]
    HistoryOutOfOrder { version: u32, previous: u32 },

    /// A history snapshot breaks a message invariant.
    #[error("history version {version}: {source}")]
    InvalidHistory {
        version: u32,
        #[source]
        source: Box<ValidationError>,
    },
}

/// Errors produced by prompt operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid prompt: {0}")]
    Validation(#[from] ValidationError),

    /// The requested version is newer than the prompt.
    #[error("version {requested} is in the future (current version is {current})")]
    FutureVersion { requested: u32, current: u32 },

    /// The requested version is not in the history (never existed or pruned).
    #[error("version {0} not found")]
    VersionNotFound(u32),

    /// The version counter cannot be incremented further.
    #[error("version {0} cannot be incremented")]
    VersionOverflow(u32),

    /// A message template failed to parse or render.
    #[error("failed to render message {index} ({role}): {message}")]
    Render {
        index: usize,
        role: Role,
        message: String,
    },

    /// A JSON prompt descriptor could not be decoded.
    #[error("invalid prompt descriptor: {0}")]
    Spec(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
