//! Transformers for Ollama Chat
//!
//! Canonical request → `/api/chat` body, and `/api/chat` response → canonical
//! response.

use crate::config::EnvSnapshot;
use crate::config::env::OLLAMA_MODEL;
use crate::types::{
    Candidate, FinishReason, GenerateContentRequest, GenerateContentResponse, UsageMetadata,
};

use super::types::{OllamaChatRequest, OllamaChatResponse, OllamaMessage, OllamaOptions};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TOP_P: f32 = 1.0;
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
/// Model used when neither `OLLAMA_MODEL`, the request nor the config names one.
pub const DEFAULT_OLLAMA_MODEL: &str = "qwen3-coder";

/// `OLLAMA_MODEL` > request model > configured model > built-in default.
pub fn resolve_model(request_model: &str, config_model: &str, env: &EnvSnapshot) -> String {
    env.get(OLLAMA_MODEL)
        .or_else(|| Some(request_model).filter(|m| !m.is_empty()))
        .or_else(|| Some(config_model).filter(|m| !m.is_empty()))
        .unwrap_or(DEFAULT_OLLAMA_MODEL)
        .to_string()
}

/// Build the native chat body.
///
/// Messages with no text are dropped. Sampling defaults fill only the values
/// the caller left unset.
pub fn transform_chat(
    request: &GenerateContentRequest,
    config_model: &str,
    env: &EnvSnapshot,
    stream: bool,
) -> OllamaChatRequest {
    let messages = request
        .chat_messages()
        .into_iter()
        .filter(|m| !m.content.is_empty())
        .map(|m| OllamaMessage {
            role: m.role,
            content: m.content,
        })
        .collect();

    let config = &request.config;
    OllamaChatRequest {
        model: resolve_model(&request.model, config_model, env),
        messages,
        stream,
        options: OllamaOptions {
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_p: config.top_p.unwrap_or(DEFAULT_TOP_P),
            top_k: config.top_k,
            max_tokens: config.max_output_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        },
    }
}

/// Normalize a single-shot response.
///
/// Without `done` there is no better completion signal, so the candidate is
/// reported as `MAX_TOKENS`.
pub fn transform_response(response: OllamaChatResponse) -> GenerateContentResponse {
    let finish_reason = if response.done {
        FinishReason::Stop
    } else {
        FinishReason::MaxTokens
    };
    let mut out = GenerateContentResponse::from_candidate(Candidate::model_text(
        response.message.content,
        Some(finish_reason),
    ));
    out.usage_metadata =
        UsageMetadata::from_counts(response.prompt_eval_count, response.eval_count);
    out.model_version = response.model;
    out
}
