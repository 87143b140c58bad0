//! OpenAI-Compatible Provider Module
//!
//! The generic adapter: any server speaking the OpenAI chat completions
//! protocol (OpenAI itself, vLLM, LM Studio, Ollama's `/v1` shim, ...).
//! Requests pass through nearly unchanged; the only quirk is that tool
//! declarations are stripped when the server is a local Ollama, which
//! rejects them.

pub mod client;
pub mod streaming;
pub mod transformers;
pub mod types;

pub use client::OpenAiContentGenerator;
pub use streaming::OpenAiStreamConverter;
pub use types::{ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse};

use std::sync::Arc;

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use crate::config::env::{OLLAMA_HOST, OPENAI_API_KEY, OPENAI_BASE_URL};
use crate::config::{EnvSnapshot, ProviderConfig};
use crate::error::LlmError;
use crate::transport::{HttpTransport, TransportAuth, TransportSettings};
use crate::types::GenerateContentRequest;

use super::{PLACEHOLDER_API_KEY, base_headers};

pub const OPENAI_COMPATIBLE_BACKEND: &str = "openai-compatible";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";
pub const EMBEDDINGS_PATH: &str = "/embeddings";

/// Base URL fragment of a local Ollama server.
const LOCAL_OLLAMA_ADDRESS: &str = "localhost:11434";

/// Generic OpenAI-compatible adapter. Selected when no other adapter matches.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    config: Arc<ProviderConfig>,
    env: EnvSnapshot,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: Arc<ProviderConfig>, env: EnvSnapshot) -> Self {
        Self { config, env }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Configured base URL, else `OPENAI_BASE_URL`, else the OpenAI endpoint.
    pub fn base_url(&self) -> String {
        self.config
            .base_url()
            .or_else(|| self.env.get(OPENAI_BASE_URL))
            .unwrap_or(DEFAULT_OPENAI_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    /// Whether the server is a local Ollama that cannot take tool declarations.
    pub fn strips_tools(&self) -> bool {
        self.env.is_set(OLLAMA_HOST) || self.base_url().contains(LOCAL_OLLAMA_ADDRESS)
    }

    /// Model sent on the wire: the request's, else the configured one.
    pub fn model_for<'a>(&'a self, request_model: &'a str) -> &'a str {
        if request_model.is_empty() {
            &self.config.model
        } else {
            request_model
        }
    }

    pub fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        base_headers(&self.config)
    }

    /// Configured key, else `OPENAI_API_KEY`, else the keyless placeholder.
    pub fn build_client(&self) -> Result<HttpTransport, LlmError> {
        let key = self
            .config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_owned())
            .or_else(|| self.env.get(OPENAI_API_KEY).map(str::to_owned))
            .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());
        HttpTransport::new(TransportSettings {
            backend: OPENAI_COMPATIBLE_BACKEND,
            base_url: self.base_url(),
            auth: TransportAuth::Bearer(SecretString::from(key)),
            timeout: self.config.timeout,
            max_retries: self.config.max_retries,
            default_headers: self.build_headers()?,
        })
    }

    pub fn build_request(
        &self,
        request: &GenerateContentRequest,
        stream: bool,
    ) -> ChatCompletionRequest {
        transformers::transform_chat(
            request,
            self.model_for(&request.model),
            stream,
            self.strips_tools(),
        )
    }
}
