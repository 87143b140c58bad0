//! Gemini wire types
//!
//! The canonical types already follow the Gemini JSON shape, so only the
//! request envelopes live here. Responses deserialize straight into
//! [`crate::types::GenerateContentResponse`].

use serde::{Deserialize, Serialize};

use crate::types::{Content, GenerationConfig, Tool};

/// Body of `:generateContent` and `:streamGenerateContent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiGenerateRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

/// Body of `:countTokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiCountTokensRequest {
    pub contents: Vec<Content>,
}

/// Body of `:batchEmbedContents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiBatchEmbedRequest {
    pub requests: Vec<GeminiEmbedRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiEmbedRequest {
    /// `models/{model}`
    pub model: String,
    pub content: Content,
}
