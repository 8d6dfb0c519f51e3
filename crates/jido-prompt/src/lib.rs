//! # jido-prompt
//!
//! Structured prompts for LLM requests: an ordered list of role-tagged
//! template messages with parameters, metadata and a linear version history.
//!
//! ```
//! use jido_prompt::{MessageItem, Prompt, PromptSpec, Role, TemplateEngine};
//!
//! let prompt = Prompt::new(
//!     PromptSpec::new()
//!         .message(MessageItem::system("You are a helpful assistant."))
//!         .message(MessageItem::user("Hello <%= @name %>").with_engine(TemplateEngine::Eex))
//!         .param("name", "Alice"),
//! )?;
//!
//! let v2 = prompt.new_version(|p| p.add_message(Role::Assistant, "Hi!"))?;
//! assert_eq!(v2.list_versions(), vec![2, 1]);
//! assert_eq!(v2.render()?[1].content, "Hello Alice");
//! # Ok::<(), jido_prompt::Error>(())
//! ```

pub mod error;
pub mod message;
mod prompt;
pub mod template;
mod version;

pub use error::{Error, Result, ValidationError};
pub use message::{MessageItem, RenderedMessage, Role, TemplateEngine, validate_messages};
pub use prompt::{MessageOptions, Metadata, Prompt, PromptSpec};
pub use template::Params;
pub use version::{HistoryEntry, VersionDiff};
