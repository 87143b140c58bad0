//! Canonical response types
//!
//! The same [`GenerateContentResponse`] shape carries both complete responses
//! and stream increments. On an increment the candidate's `finish_reason` is
//! `None` until the terminal frame.

use serde::{Deserialize, Serialize};

use super::common::{FinishReason, Role};
use super::content::{Content, FunctionCall, Part};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Content,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(default)]
    pub index: u32,
    /// Opaque safety metadata, passed through untouched.
    #[serde(default)]
    pub safety_ratings: Vec<serde_json::Value>,
}

impl Candidate {
    /// Single-candidate helper used by the normalizers: role `model`, index 0.
    pub fn model_text(text: impl Into<String>, finish_reason: Option<FinishReason>) -> Self {
        Self {
            content: Content::new(Role::Model, vec![Part::text(text)]),
            finish_reason,
            index: 0,
            safety_ratings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub safety_ratings: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<u32>,
}

impl UsageMetadata {
    pub fn from_counts(prompt: Option<u32>, candidates: Option<u32>) -> Option<Self> {
        if prompt.is_none() && candidates.is_none() {
            return None;
        }
        let total = prompt.unwrap_or(0).saturating_add(candidates.unwrap_or(0));
        Some(Self {
            prompt_token_count: prompt,
            candidates_token_count: candidates,
            total_token_count: Some(total),
        })
    }
}

/// Canonical response, or one increment of a stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

/// A stream increment. Same shape as a complete response.
pub type PartialResponse = GenerateContentResponse;

impl GenerateContentResponse {
    /// Response with one candidate and empty prompt feedback.
    pub fn from_candidate(candidate: Candidate) -> Self {
        Self {
            candidates: vec![candidate],
            prompt_feedback: Some(PromptFeedback::default()),
            ..Default::default()
        }
    }

    /// Text of the first candidate, if it has any text parts.
    pub fn text(&self) -> Option<String> {
        let content = &self.candidates.first()?.content;
        content
            .parts
            .iter()
            .any(|p| p.text.is_some())
            .then(|| content.text())
    }

    pub fn finish_reason(&self) -> Option<FinishReason> {
        self.candidates.first()?.finish_reason
    }

    pub fn function_calls(&self) -> Vec<&FunctionCall> {
        self.candidates
            .iter()
            .flat_map(|c| c.content.parts.iter())
            .filter_map(|p| p.function_call.as_ref())
            .collect()
    }
}
