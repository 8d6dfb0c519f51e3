//! The prompt document: construction, mutation and rendering.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result, ValidationError};
use crate::message::{
    MessageItem, RawMessage, RenderedMessage, Role, TemplateEngine, validate_messages,
};
use crate::template::{self, Params};
use crate::version::{HistoryEntry, validate_history};

/// Free-form prompt metadata.
pub type Metadata = Map<String, Value>;

/// Everything needed to construct a [`Prompt`].
#[derive(Debug, Clone, Default)]
pub struct PromptSpec {
    /// Prompt identifier. A random UUID is used when absent.
    pub id: Option<String>,
    pub messages: Vec<MessageItem>,
    pub params: Params,
    pub metadata: Metadata,
    pub output_schema: Option<Value>,
}

impl PromptSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn message(mut self, message: MessageItem) -> Self {
        self.messages.push(message);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Options for [`Prompt::from_role_with`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageOptions {
    pub engine: TemplateEngine,
    /// Function name, required for [`Role::Function`].
    pub name: Option<String>,
    pub params: Params,
}

impl MessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(mut self, engine: TemplateEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// JSON form of a [`PromptSpec`]; role and engine tags are parsed after
/// decoding so unknown tags surface as validation errors.
#[derive(Debug, Deserialize)]
struct RawPromptSpec {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    messages: Vec<RawMessage>,
    #[serde(default)]
    params: Params,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    output_schema: Option<Value>,
}

/// A versioned, ordered list of role-tagged template messages.
///
/// At most one message has [`Role::System`], and if present it is first.
/// Every operation that would break this returns
/// [`Error::Validation`] and leaves the receiver untouched. Mutations never
/// change a prompt in place; they return a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PromptData")]
pub struct Prompt {
    pub(crate) id: String,
    pub(crate) version: u32,
    pub(crate) messages: Vec<MessageItem>,
    /// Snapshots of earlier versions, newest first.
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) params: Params,
    pub(crate) metadata: Metadata,
    pub(crate) output_schema: Option<Value>,
}

#[derive(Deserialize)]
struct PromptData {
    id: String,
    version: u32,
    messages: Vec<MessageItem>,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    params: Params,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    output_schema: Option<Value>,
}

impl TryFrom<PromptData> for Prompt {
    type Error = ValidationError;

    fn try_from(data: PromptData) -> std::result::Result<Self, Self::Error> {
        validate_messages(&data.messages)?;
        validate_history(data.version, &data.history)?;
        Ok(Prompt {
            id: data.id,
            version: data.version,
            messages: data.messages,
            history: data.history,
            params: data.params,
            metadata: data.metadata,
            output_schema: data.output_schema,
        })
    }
}

impl Prompt {
    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Build a version-1 prompt from a spec.
    pub fn new(spec: PromptSpec) -> Result<Prompt> {
        validate_messages(&spec.messages)?;
        Ok(Prompt {
            id: spec.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            version: 1,
            messages: spec.messages,
            history: Vec::new(),
            params: spec.params,
            metadata: spec.metadata,
            output_schema: spec.output_schema,
        })
    }

    /// Build a prompt from a JSON descriptor:
    /// `{"messages": [{"role": "user", "content": "..", "engine": "eex"}], "params": {..}}`.
    pub fn from_spec_value(value: Value) -> Result<Prompt> {
        let raw: RawPromptSpec = serde_json::from_value(value)?;
        let messages = raw
            .messages
            .into_iter()
            .map(MessageItem::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Prompt::new(PromptSpec {
            id: raw.id,
            messages,
            params: raw.params,
            metadata: raw.metadata,
            output_schema: raw.output_schema,
        })
    }

    /// A prompt holding a single message.
    pub fn from_message(message: MessageItem) -> Result<Prompt> {
        Prompt::new(PromptSpec::new().message(message))
    }

    /// A prompt holding a single plain (untemplated) message.
    pub fn from_role(role: Role, content: impl Into<String>) -> Result<Prompt> {
        Prompt::from_message(MessageItem::new(role, content))
    }

    /// A prompt holding a single message built from `role`, `content` and
    /// `options` (engine, function name and params).
    pub fn from_role_with(
        role: Role,
        content: impl Into<String>,
        options: MessageOptions,
    ) -> Result<Prompt> {
        let message = MessageItem {
            role,
            content: content.into(),
            engine: options.engine,
            name: options.name,
        };
        Prompt::new(PromptSpec {
            messages: vec![message],
            params: options.params,
            ..PromptSpec::default()
        })
    }

    /// Wrap a bare instruction string as a single system message.
    pub fn from_plain_string(content: impl Into<String>) -> Prompt {
        Prompt {
            id: uuid::Uuid::new_v4().to_string(),
            version: 1,
            messages: vec![MessageItem::system(content)],
            history: Vec::new(),
            params: Params::new(),
            metadata: Metadata::new(),
            output_schema: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn messages(&self) -> &[MessageItem] {
        &self.messages
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn output_schema(&self) -> Option<&Value> {
        self.output_schema.as_ref()
    }

    // -----------------------------------------------------------------------
    // Mutation (copy-on-write)
    // -----------------------------------------------------------------------

    /// Append a plain message.
    pub fn add_message(&self, role: Role, content: impl Into<String>) -> Result<Prompt> {
        self.add_item(MessageItem::new(role, content))
    }

    /// Append a message, re-validating the whole list.
    pub fn add_item(&self, message: MessageItem) -> Result<Prompt> {
        let mut messages = self.messages.clone();
        messages.push(message);
        validate_messages(&messages)?;
        Ok(Prompt {
            messages,
            ..self.clone()
        })
    }

    /// Replace the template parameters.
    pub fn with_params(mut self, params: Params) -> Prompt {
        self.params = params;
        self
    }

    /// Set one template parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Prompt {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Prompt {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Attach a JSON schema the model's output is expected to follow.
    pub fn with_output_schema(mut self, schema: Value) -> Prompt {
        self.output_schema = Some(schema);
        self
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Render every message with the prompt's own params.
    pub fn render(&self) -> Result<Vec<RenderedMessage>> {
        self.render_with(&Params::new())
    }

    /// Render every message with `overrides` merged over the prompt's params
    /// (overrides win on collision).
    pub fn render_with(&self, overrides: &Params) -> Result<Vec<RenderedMessage>> {
        let mut params = self.params.clone();
        params.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        self.messages
            .iter()
            .enumerate()
            .map(|(index, message)| -> Result<RenderedMessage> {
                let content = template::render(message.engine, &message.content, &params)
                    .map_err(|message_err| Error::Render {
                        index,
                        role: message.role,
                        message: message_err,
                    })?;
                Ok(RenderedMessage {
                    role: message.role,
                    content,
                    name: message.name.clone(),
                })
            })
            .collect()
    }

    /// Render as `[role] content` lines. For logs and debugging only.
    pub fn to_text(&self, overrides: &Params) -> Result<String> {
        let lines: Vec<String> = self
            .render_with(overrides)?
            .into_iter()
            .map(|m| format!("[{}] {}", m.role, m.content))
            .collect();
        Ok(lines.join("\n"))
    }
}

impl From<&str> for Prompt {
    fn from(content: &str) -> Self {
        Prompt::from_plain_string(content)
    }
}

impl From<String> for Prompt {
    fn from(content: String) -> Self {
        Prompt::from_plain_string(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn add_message_appends_and_renders_in_order() {
        let prompt = Prompt::new(PromptSpec::new().message(MessageItem::user("Hello"))).unwrap();
        let next = prompt.add_message(Role::Assistant, "Hi!").unwrap();

        assert_eq!(
            next.render().unwrap(),
            vec![
                RenderedMessage::new(Role::User, "Hello"),
                RenderedMessage::new(Role::Assistant, "Hi!"),
            ]
        );
        assert_eq!(prompt.messages().len(), 1);
    }

    #[test]
    fn eex_params_and_overrides() {
        let prompt = Prompt::new(
            PromptSpec::new()
                .message(MessageItem::user("Hello <%= @name %>").with_engine(TemplateEngine::Eex))
                .param("name", "Alice"),
        )
        .unwrap();

        assert_eq!(
            prompt.render().unwrap(),
            vec![RenderedMessage::new(Role::User, "Hello Alice")]
        );
        assert_eq!(
            prompt.render_with(&params(json!({"name": "Bob"}))).unwrap(),
            vec![RenderedMessage::new(Role::User, "Hello Bob")]
        );
    }

    #[test]
    fn system_after_user_is_rejected() {
        let err = Prompt::new(
            PromptSpec::new()
                .message(MessageItem::user("hi"))
                .message(MessageItem::system("sys")),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::SystemNotFirst { index: 1 })
        ));
    }

    #[test]
    fn adding_a_second_system_message_fails_and_keeps_the_original() {
        let prompt = Prompt::from_plain_string("You are terse.");
        let err = prompt.add_message(Role::System, "Be verbose.").unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::MultipleSystem)));

        let late = Prompt::from_role(Role::User, "hi").unwrap();
        assert!(late.add_message(Role::System, "sys").is_err());
        assert_eq!(late.messages().len(), 1);
        assert_eq!(prompt.messages(), &[MessageItem::system("You are terse.")]);
    }

    #[test]
    fn from_role_with_sets_engine_name_and_params() {
        let prompt = Prompt::from_role_with(
            Role::User,
            "Hello <%= @name %>",
            MessageOptions::new()
                .engine(TemplateEngine::Eex)
                .param("name", "Alice"),
        )
        .unwrap();
        assert_eq!(prompt.render().unwrap()[0].content, "Hello Alice");

        let call = Prompt::from_role_with(
            Role::Function,
            "{}",
            MessageOptions::new().name("lookup"),
        )
        .unwrap();
        assert_eq!(call.messages()[0].name.as_deref(), Some("lookup"));

        assert!(matches!(
            Prompt::from_role_with(Role::Function, "{}", MessageOptions::new()),
            Err(Error::Validation(ValidationError::MissingFunctionName { index: 0 }))
        ));
    }

    #[test]
    fn plain_strings_become_system_prompts() {
        let prompt: Prompt = "Summarize the input.".into();
        assert_eq!(prompt.version(), 1);
        assert_eq!(
            prompt.render().unwrap(),
            vec![RenderedMessage::new(Role::System, "Summarize the input.")]
        );
    }

    #[test]
    fn plain_messages_render_unchanged() {
        let prompt = Prompt::new(
            PromptSpec::new()
                .message(MessageItem::system("rules <%= @x %>"))
                .message(MessageItem::user("{{ y }}"))
                .message(MessageItem::function("lookup", "{\"ok\":true}")),
        )
        .unwrap();

        let rendered = prompt.render().unwrap();
        for (message, out) in prompt.messages().iter().zip(&rendered) {
            assert_eq!(out.role, message.role);
            assert_eq!(out.content, message.content);
            assert_eq!(out.name, message.name);
        }
    }

    #[test]
    fn render_failure_names_the_message() {
        let prompt = Prompt::new(
            PromptSpec::new()
                .message(MessageItem::system("fine"))
                .message(MessageItem::user("{% if %}").with_engine(TemplateEngine::Liquid)),
        )
        .unwrap();

        match prompt.render().unwrap_err() {
            Error::Render { index, role, .. } => {
                assert_eq!(index, 1);
                assert_eq!(role, Role::User);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn to_text_joins_role_lines() {
        let prompt = Prompt::from_plain_string("Be brief.")
            .add_message(Role::User, "Hi")
            .unwrap();
        assert_eq!(
            prompt.to_text(&Params::new()).unwrap(),
            "[system] Be brief.\n[user] Hi"
        );
    }

    #[test]
    fn json_descriptors_validate_tags() {
        let prompt = Prompt::from_spec_value(json!({
            "id": "greeting",
            "messages": [{"role": "user", "content": "Hi {{ name }}", "engine": "liquid"}],
            "params": {"name": "Ada"}
        }))
        .unwrap();
        assert_eq!(prompt.id(), "greeting");
        assert_eq!(prompt.render().unwrap()[0].content, "Hi Ada");

        let err = Prompt::from_spec_value(json!({
            "messages": [{"role": "user", "content": "x", "engine": "mustache"}]
        }))
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::UnsupportedEngine(_))
        ));
    }

    #[test]
    fn deserializing_an_invalid_prompt_fails() {
        let err = serde_json::from_value::<Prompt>(json!({
            "id": "p",
            "version": 1,
            "messages": [
                {"role": "user", "content": "a"},
                {"role": "system", "content": "b"}
            ]
        }));
        assert!(err.is_err());
    }

    #[test]
    fn deserializing_a_bad_history_fails() {
        let future_entry = serde_json::from_value::<Prompt>(json!({
            "id": "p",
            "version": 1,
            "messages": [{"role": "user", "content": "a"}],
            "history": [{"version": 7, "messages": [{"role": "user", "content": "old"}]}]
        }));
        assert!(future_entry.unwrap_err().to_string().contains("must be lower than 1"));

        let bad_snapshot = serde_json::from_value::<Prompt>(json!({
            "id": "p",
            "version": 5,
            "messages": [{"role": "user", "content": "a"}],
            "history": [{
                "version": 3,
                "messages": [
                    {"role": "user", "content": "a"},
                    {"role": "system", "content": "b"}
                ]
            }]
        }));
        assert!(bad_snapshot.unwrap_err().to_string().contains("history version 3"));

        let zero = serde_json::from_value::<Prompt>(json!({
            "id": "p",
            "version": 0,
            "messages": []
        }));
        assert!(zero.unwrap_err().to_string().contains("start at 1"));
    }

    #[test]
    fn serialized_prompts_round_trip_with_history() {
        let p2 = Prompt::from_role(Role::User, "Hello")
            .and_then(|p| p.new_version(|p| p.add_message(Role::Assistant, "Hi!")))
            .unwrap();
        let back: Prompt = serde_json::from_value(serde_json::to_value(&p2).unwrap()).unwrap();
        assert_eq!(back, p2);
        assert_eq!(back.list_versions(), vec![2, 1]);
    }

    #[test]
    fn builders_set_params_metadata_and_schema() {
        let prompt = Prompt::from_plain_string("x")
            .with_param("tone", "dry")
            .with_metadata("owner", "docs")
            .with_output_schema(json!({"type": "object"}));
        assert_eq!(prompt.params()["tone"], json!("dry"));
        assert_eq!(prompt.metadata()["owner"], json!("docs"));
        assert_eq!(prompt.output_schema(), Some(&json!({"type": "object"})));
    }
}
