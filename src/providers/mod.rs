//! Backend adapters
//!
//! Each adapter is a request translator, a response normalizer and a
//! selection predicate for one backend family:
//!
//! - [`gemini`]: Gemini-style API (API key, Vertex AI and hosted login)
//! - [`ollama`]: native local Ollama server
//! - [`openai_compatible`]: any OpenAI-compatible chat completions endpoint

pub mod gemini;
pub mod ollama;
pub mod openai_compatible;

use reqwest::header::HeaderMap;

use crate::config::ProviderConfig;
use crate::error::LlmError;
use crate::utils::http_headers::{HttpHeaderBuilder, user_agent};

/// Key handed to keyless local backends that still expect one.
pub const PLACEHOLDER_API_KEY: &str = "ollama";

/// Identification header, JSON content type and the caller's extra headers.
pub(crate) fn base_headers(config: &ProviderConfig) -> Result<HeaderMap, LlmError> {
    Ok(HttpHeaderBuilder::new()
        .with_user_agent(&user_agent(config.client_version.as_deref()))?
        .with_json_content_type()
        .with_custom_headers(&config.extra_headers)?
        .build())
}

/// Drop a trailing `/` and then a trailing `/v1`.
pub(crate) fn trim_base_url(url: &str) -> String {
    let url = url.trim_end_matches('/');
    url.strip_suffix("/v1").unwrap_or(url).to_string()
}
