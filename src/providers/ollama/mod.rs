//! Ollama Provider Module
//!
//! Talks to a local Ollama server through its native `/api/chat` endpoint,
//! non-streaming and newline-delimited JSON streaming. The server has no
//! token counting or embedding support here, so those fall back to the
//! estimate and to empty vectors.

pub mod client;
pub mod streaming;
pub mod transformers;
pub mod types;

pub use client::OllamaContentGenerator;
pub use streaming::{StreamDecodeState, decode_ndjson_stream};
pub use types::{OllamaChatRequest, OllamaChatResponse, OllamaStreamFrame};

use std::sync::Arc;

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use crate::config::env::{OLLAMA_HOST, OLLAMA_MODEL};
use crate::config::{EnvSnapshot, ProviderConfig};
use crate::error::LlmError;
use crate::transport::{HttpTransport, TransportAuth, TransportSettings};
use crate::types::GenerateContentRequest;

use super::{PLACEHOLDER_API_KEY, base_headers, trim_base_url};

pub const OLLAMA_BACKEND: &str = "ollama";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const CHAT_PATH: &str = "/api/chat";

/// Adapter for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    config: Arc<ProviderConfig>,
    env: EnvSnapshot,
}

impl OllamaProvider {
    pub fn new(config: Arc<ProviderConfig>, env: EnvSnapshot) -> Self {
        Self { config, env }
    }

    /// Selection predicate: an `ollama` base URL, or either Ollama variable set.
    pub fn matches(config: &ProviderConfig, env: &EnvSnapshot) -> bool {
        config.base_url().is_some_and(|u| u.contains("ollama"))
            || env.is_set(OLLAMA_HOST)
            || env.is_set(OLLAMA_MODEL)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn env(&self) -> &EnvSnapshot {
        &self.env
    }

    /// Configured base URL, else `OLLAMA_HOST`, else the local default;
    /// without a trailing `/` or `/v1`.
    pub fn base_url(&self) -> String {
        let url = self
            .config
            .base_url()
            .or_else(|| self.env.get(OLLAMA_HOST))
            .unwrap_or(DEFAULT_OLLAMA_BASE_URL);
        trim_base_url(url)
    }

    /// No auth header: the local server does not check one.
    pub fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        base_headers(&self.config)
    }

    pub fn build_client(&self) -> Result<HttpTransport, LlmError> {
        let key = self
            .config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_owned())
            .unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string());
        HttpTransport::new(TransportSettings {
            backend: OLLAMA_BACKEND,
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
    ) -> OllamaChatRequest {
        transformers::transform_chat(request, &self.config.model, &self.env, stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{AUTHORIZATION, USER_AGENT};

    fn provider(config: ProviderConfig, pairs: &[(&str, &str)]) -> OllamaProvider {
        OllamaProvider::new(
            Arc::new(config),
            EnvSnapshot::from_pairs(pairs.iter().copied()),
        )
    }

    #[test]
    fn predicate_uses_url_and_env_signals() {
        let none = EnvSnapshot::default();
        assert!(OllamaProvider::matches(
            &ProviderConfig::new("m").with_base_url("http://ollama.internal:11434"),
            &none
        ));
        assert!(!OllamaProvider::matches(&ProviderConfig::new("m"), &none));
        assert!(OllamaProvider::matches(
            &ProviderConfig::new("m"),
            &EnvSnapshot::from_pairs([(OLLAMA_MODEL, "llama3")])
        ));
    }

    #[test]
    fn base_url_precedence_and_trimming() {
        assert_eq!(
            provider(ProviderConfig::new("m"), &[]).base_url(),
            DEFAULT_OLLAMA_BASE_URL
        );
        assert_eq!(
            provider(ProviderConfig::new("m"), &[(OLLAMA_HOST, "http://gpu:11434/v1/")]).base_url(),
            "http://gpu:11434"
        );
        assert_eq!(
            provider(
                ProviderConfig::new("m").with_base_url("http://cfg:1/"),
                &[(OLLAMA_HOST, "http://gpu:11434")]
            )
            .base_url(),
            "http://cfg:1"
        );
    }

    #[test]
    fn headers_identify_without_auth() {
        let headers = provider(ProviderConfig::new("m"), &[]).build_headers().unwrap();
        assert!(headers.contains_key(USER_AGENT));
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn client_gets_placeholder_key_and_config_limits() {
        let p = provider(
            ProviderConfig::new("m")
                .with_timeout(std::time::Duration::from_secs(9))
                .with_max_retries(1),
            &[],
        );
        let client = p.build_client().unwrap();
        assert_eq!(client.api_key().unwrap().expose_secret(), PLACEHOLDER_API_KEY);
        assert_eq!(client.base_url(), DEFAULT_OLLAMA_BASE_URL);
        assert_eq!(client.timeout(), std::time::Duration::from_secs(9));
        assert_eq!(client.max_retries(), 1);
        assert!(client.default_headers().contains_key(USER_AGENT));
    }
}
