//! Canonical request types

use serde::{Deserialize, Serialize};

use super::content::{ChatMessage, Content};

/// Sampling parameters. Unset values are left to the adapter's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub const fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub const fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }
}

/// A function the model may call. `parameters` is an opaque JSON schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDeclaration {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// A group of function declarations, Gemini style.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    #[serde(default)]
    pub function_declarations: Vec<FunctionDeclaration>,
}

impl Tool {
    pub fn functions(function_declarations: Vec<FunctionDeclaration>) -> Self {
        Self {
            function_declarations,
        }
    }
}

/// The backend-agnostic generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    /// Model id. May be overridden by the adapter (see the Ollama adapter).
    pub model: String,
    /// Conversation history, oldest first.
    pub contents: Vec<Content>,
    pub system_instruction: Option<Content>,
    pub config: GenerationConfig,
    pub tools: Option<Vec<Tool>>,
    /// Caller-supplied correlation id, carried into logs.
    pub prompt_id: String,
}

impl GenerateContentRequest {
    /// New request with a random correlation id.
    pub fn new(model: impl Into<String>, contents: Vec<Content>) -> Self {
        Self {
            model: model.into(),
            contents,
            system_instruction: None,
            config: GenerationConfig::default(),
            tools: None,
            prompt_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn with_prompt_id(mut self, prompt_id: impl Into<String>) -> Self {
        self.prompt_id = prompt_id.into();
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_system_instruction(mut self, instruction: Content) -> Self {
        self.system_instruction = Some(instruction);
        self
    }

    /// System instruction first, then every turn, flattened to text.
    ///
    /// Empty messages are kept; adapters that cannot accept them filter.
    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.system_instruction
            .iter()
            .map(|c| ChatMessage::new(super::MessageRole::System, c.text()))
            .chain(self.contents.iter().map(ChatMessage::from_content))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountTokensRequest {
    pub model: String,
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedContentRequest {
    pub model: String,
    pub contents: Vec<Content>,
}
