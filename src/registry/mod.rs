//! Provider registry
//!
//! The set of adapters is closed. Each adapter declares an applicability
//! predicate over the effective auth mode, the config and the environment
//! snapshot; [`ADAPTER_PRIORITY`] lists them in evaluation order and the first
//! match wins. When nothing matches, the generic OpenAI-compatible adapter is
//! used.

use std::sync::Arc;

use reqwest::header::HeaderMap;

use crate::auth::AuthMode;
use crate::config::{EnvSnapshot, ProviderConfig};
use crate::error::LlmError;
use crate::providers::gemini::{GEMINI_BACKEND, GeminiProvider};
use crate::providers::ollama::{OLLAMA_BACKEND, OllamaProvider};
use crate::providers::openai_compatible::{OPENAI_COMPATIBLE_BACKEND, OpenAiCompatibleProvider};
use crate::transport::HttpTransport;
use crate::types::GenerateContentRequest;

/// Adapter families, without their state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKind {
    Gemini,
    Ollama,
    OpenAiCompatible,
}

impl AdapterKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => GEMINI_BACKEND,
            Self::Ollama => OLLAMA_BACKEND,
            Self::OpenAiCompatible => OPENAI_COMPATIBLE_BACKEND,
        }
    }
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type Predicate = fn(AuthMode, &ProviderConfig, &EnvSnapshot) -> bool;

fn gemini_applies(mode: AuthMode, _: &ProviderConfig, _: &EnvSnapshot) -> bool {
    GeminiProvider::matches(mode)
}

fn ollama_applies(_: AuthMode, config: &ProviderConfig, env: &EnvSnapshot) -> bool {
    OllamaProvider::matches(config, env)
}

/// Predicates in evaluation order. The generic adapter is the fallback and
/// has no entry.
pub const ADAPTER_PRIORITY: [(AdapterKind, Predicate); 2] = [
    (AdapterKind::Gemini, gemini_applies),
    (AdapterKind::Ollama, ollama_applies),
];

/// Which adapter applies. Pure function of its inputs.
pub fn select_adapter_kind(
    auth_mode: AuthMode,
    config: &ProviderConfig,
    env: &EnvSnapshot,
) -> AdapterKind {
    ADAPTER_PRIORITY
        .iter()
        .find(|(_, applies)| applies(auth_mode, config, env))
        .map_or(AdapterKind::OpenAiCompatible, |(kind, _)| *kind)
}

/// A selected adapter bound to the session's config.
#[derive(Debug, Clone)]
pub enum ProviderAdapter {
    Gemini(GeminiProvider),
    Ollama(OllamaProvider),
    OpenAiCompatible(OpenAiCompatibleProvider),
}

impl ProviderAdapter {
    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Gemini(_) => AdapterKind::Gemini,
            Self::Ollama(_) => AdapterKind::Ollama,
            Self::OpenAiCompatible(_) => AdapterKind::OpenAiCompatible,
        }
    }

    pub fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        match self {
            Self::Gemini(p) => p.build_headers(),
            Self::Ollama(p) => p.build_headers(),
            Self::OpenAiCompatible(p) => p.build_headers(),
        }
    }

    pub fn build_client(&self) -> Result<HttpTransport, LlmError> {
        match self {
            Self::Gemini(p) => p.build_client(),
            Self::Ollama(p) => p.build_client(),
            Self::OpenAiCompatible(p) => p.build_client(),
        }
    }

    /// Native request body as JSON.
    pub fn build_request(
        &self,
        request: &GenerateContentRequest,
        stream: bool,
    ) -> Result<serde_json::Value, LlmError> {
        Ok(match self {
            Self::Gemini(p) => serde_json::to_value(p.build_request(request))?,
            Self::Ollama(p) => serde_json::to_value(p.build_request(request, stream))?,
            Self::OpenAiCompatible(p) => serde_json::to_value(p.build_request(request, stream))?,
        })
    }
}

/// Pick the adapter for this session and bind it to the shared config.
pub fn select_adapter(
    auth_mode: AuthMode,
    config: Arc<ProviderConfig>,
    env: &EnvSnapshot,
) -> ProviderAdapter {
    let env = env.clone();
    match select_adapter_kind(auth_mode, &config, &env) {
        AdapterKind::Gemini => ProviderAdapter::Gemini(GeminiProvider::new(config, env, auth_mode)),
        AdapterKind::Ollama => ProviderAdapter::Ollama(OllamaProvider::new(config, env)),
        AdapterKind::OpenAiCompatible => {
            ProviderAdapter::OpenAiCompatible(OpenAiCompatibleProvider::new(config, env))
        }
    }
}
