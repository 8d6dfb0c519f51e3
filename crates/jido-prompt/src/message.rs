//! Role-tagged template messages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Who a message is from.
///
/// Deserializes through [`FromStr`], so tags are case-insensitive and
/// `"tool"` reads as [`Role::Function`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Function / tool output.
    Function,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Function => "function",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "function" | "tool" => Ok(Role::Function),
            _ => Err(ValidationError::UnsupportedRole(s.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = ValidationError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// Template engine used to render a message's content.
///
/// The set is closed; rendering dispatches on it in
/// [`template::render`](crate::template::render). Deserializes through
/// [`FromStr`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum TemplateEngine {
    /// Content is used verbatim.
    #[default]
    None,
    /// Embedded expressions: `<%= @name %>`.
    Eex,
    /// Liquid: `{{ name | upcase }}`, `{% if %}`.
    Liquid,
    /// Handlebars: `{{name}}`, `{{#if}}`.
    Handlebars,
}

impl TemplateEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            TemplateEngine::None => "none",
            TemplateEngine::Eex => "eex",
            TemplateEngine::Liquid => "liquid",
            TemplateEngine::Handlebars => "handlebars",
        }
    }
}

impl fmt::Display for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateEngine {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(TemplateEngine::None),
            "eex" => Ok(TemplateEngine::Eex),
            "liquid" => Ok(TemplateEngine::Liquid),
            "handlebars" | "hbs" => Ok(TemplateEngine::Handlebars),
            _ => Err(ValidationError::UnsupportedEngine(s.to_string())),
        }
    }
}

impl TryFrom<String> for TemplateEngine {
    type Error = ValidationError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

/// A single prompt message. Immutable once part of a prompt; edits happen
/// by producing a new prompt version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageItem {
    pub role: Role,
    /// Template source.
    pub content: String,
    #[serde(default)]
    pub engine: TemplateEngine,
    /// Function name, required for [`Role::Function`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl MessageItem {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            engine: TemplateEngine::None,
            name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn function(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(Role::Function, content).with_name(name)
    }

    pub fn with_engine(mut self, engine: TemplateEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A message after template substitution, ready to hand to a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RenderedMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
        }
    }
}

/// Untyped message descriptor, as read from JSON.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawMessage {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub engine: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl TryFrom<RawMessage> for MessageItem {
    type Error = ValidationError;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let engine = match raw.engine.as_deref() {
            Some(tag) => tag.parse()?,
            None => TemplateEngine::None,
        };
        Ok(MessageItem {
            role: raw.role.parse()?,
            content: raw.content,
            engine,
            name: raw.name,
        })
    }
}

/// Check the structural invariants over a full message list:
/// at most one system message, and only at index 0; function messages are
/// named.
pub fn validate_messages(messages: &[MessageItem]) -> Result<(), ValidationError> {
    for (index, message) in messages.iter().enumerate() {
        match message.role {
            Role::System if index > 0 => {
                return Err(if messages[0].role == Role::System {
                    ValidationError::MultipleSystem
                } else {
                    ValidationError::SystemNotFirst { index }
                });
            }
            Role::Function if message.name.as_deref().is_none_or(str::is_empty) => {
                return Err(ValidationError::MissingFunctionName { index });
            }
            _ => {}
        }
    }
    Ok(())
}
