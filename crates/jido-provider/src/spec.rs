//! Model metadata as reported by a provider's catalog or model listing.

use serde::{Deserialize, Serialize};

/// A model entry offered by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Canonical model identifier, e.g. `"claude-3-5-haiku-latest"`.
    pub id: String,

    /// Human-friendly display name.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Whether the model supports reasoning / chain-of-thought.
    #[serde(default)]
    pub reasoning: bool,

    /// Whether the model supports tool/function calling.
    #[serde(default)]
    pub tool_call: bool,

    #[serde(default)]
    pub architecture: Option<Architecture>,

    /// Pricing information (per million tokens).
    #[serde(default)]
    pub cost: Option<ModelCost>,

    /// Token limits.
    #[serde(default)]
    pub limit: Option<ModelLimit>,
}

impl ModelSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_limit(mut self, context: u64, output: u64) -> Self {
        self.limit = Some(ModelLimit { context, output });
        self
    }

    pub fn with_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = Some(architecture);
        self
    }

    pub fn with_tools(mut self) -> Self {
        self.tool_call = true;
        self
    }

    pub fn with_reasoning(mut self) -> Self {
        self.reasoning = true;
        self
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Input/output shape of a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Architecture {
    /// Modality string in `input->output` form, e.g. `"text+image->text"`.
    pub modality: String,
    #[serde(default)]
    pub tokenizer: Option<String>,
    #[serde(default)]
    pub instruct_type: Option<String>,
}

impl Architecture {
    pub fn new(modality: impl Into<String>) -> Self {
        Self {
            modality: modality.into(),
            tokenizer: None,
            instruct_type: None,
        }
    }

    pub fn text() -> Self {
        Self::new("text->text")
    }

    pub fn multimodal() -> Self {
        Self::new("text+image->text")
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Into<String>) -> Self {
        self.tokenizer = Some(tokenizer.into());
        self
    }
}

impl Default for Architecture {
    fn default() -> Self {
        Self::text()
    }
}

/// Cost per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelCost {
    #[serde(default)]
    pub input: f64,
    #[serde(default)]
    pub output: f64,
}

/// Token limits for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelLimit {
    /// Maximum context window size in tokens.
    pub context: u64,
    /// Maximum output tokens.
    pub output: u64,
}
