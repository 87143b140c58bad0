//! Google Gemini Provider Module
//!
//! Serves the three Google auth modes with one wire format:
//! - Gemini API key (`x-goog-api-key`)
//! - Vertex AI (project/location endpoint with a bearer token, or express
//!   mode with an API key)
//! - hosted Google login (bearer token from the external login flow)
//!
//! Token counting and embeddings use the native endpoints.

pub mod client;
pub mod convert;
pub mod streaming;
pub mod types;

pub use client::GeminiContentGenerator;
pub use streaming::GeminiStreamConverter;

use std::sync::Arc;

use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use crate::auth::AuthMode;
use crate::config::env::{
    GEMINI_API_KEY, GOOGLE_API_KEY, GOOGLE_CLOUD_LOCATION, GOOGLE_CLOUD_PROJECT,
};
use crate::config::{EnvSnapshot, ProviderConfig};
use crate::error::LlmError;
use crate::transport::{HttpTransport, TransportAuth, TransportSettings};
use crate::types::GenerateContentRequest;
use crate::utils::vertex::{vertex_base_url, vertex_express_base_url};

use super::base_headers;
use types::GeminiGenerateRequest;

pub const GEMINI_BACKEND: &str = "gemini";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Adapter for the Google auth modes.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    config: Arc<ProviderConfig>,
    env: EnvSnapshot,
    auth_mode: AuthMode,
}

impl GeminiProvider {
    pub fn new(config: Arc<ProviderConfig>, env: EnvSnapshot, auth_mode: AuthMode) -> Self {
        Self {
            config,
            env,
            auth_mode,
        }
    }

    /// Selection predicate: any Google auth mode.
    pub fn matches(auth_mode: AuthMode) -> bool {
        auth_mode.is_google()
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn base_url(&self) -> String {
        if let Some(url) = self.config.base_url() {
            return url.trim_end_matches('/').to_string();
        }
        if self.auth_mode != AuthMode::UseVertexAi {
            return DEFAULT_GEMINI_BASE_URL.to_string();
        }
        match (
            self.env.get(GOOGLE_CLOUD_PROJECT),
            self.env.get(GOOGLE_CLOUD_LOCATION),
        ) {
            (Some(project), Some(location)) => vertex_base_url(project, location, "google"),
            _ => vertex_express_base_url("google"),
        }
    }

    fn api_key(&self) -> Option<String> {
        let from_env = match self.auth_mode {
            AuthMode::UseGemini => self.env.get(GEMINI_API_KEY),
            AuthMode::UseVertexAi => self.env.get(GOOGLE_API_KEY),
            AuthMode::LoginWithGoogle | AuthMode::UseOpenAi => None,
        };
        self.config
            .api_key
            .as_ref()
            .map(|k| k.expose_secret().to_owned())
            .or_else(|| from_env.map(str::to_owned))
    }

    fn access_token(&self) -> Option<SecretString> {
        self.config
            .access_token
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_owned()))
    }

    /// Credentials for the transport.
    ///
    /// Gemini key mode prefers the key; Vertex and hosted login prefer the
    /// bearer token and fall back to a key.
    pub fn credentials(&self) -> Result<TransportAuth, LlmError> {
        let key = || {
            self.api_key().map(|key| TransportAuth::KeyHeader {
                header: API_KEY_HEADER,
                key: SecretString::from(key),
            })
        };
        let token = || self.access_token().map(TransportAuth::Bearer);
        let auth = match self.auth_mode {
            AuthMode::UseGemini => key().or_else(token),
            _ => token().or_else(key),
        };
        auth.ok_or_else(|| {
            LlmError::ConfigurationError(format!(
                "{} needs an access token or an API key for the Gemini API",
                self.auth_mode
            ))
        })
    }

    pub fn build_headers(&self) -> Result<HeaderMap, LlmError> {
        base_headers(&self.config)
    }

    pub fn build_client(&self) -> Result<HttpTransport, LlmError> {
        HttpTransport::new(TransportSettings {
            backend: GEMINI_BACKEND,
            base_url: self.base_url(),
            auth: self.credentials()?,
            timeout: self.config.timeout,
            max_retries: self.config.max_retries,
            default_headers: self.build_headers()?,
        })
    }

    /// Model for the URL path: the request's, else the configured one.
    pub fn model_for<'a>(&'a self, request_model: &'a str) -> &'a str {
        if request_model.is_empty() {
            &self.config.model
        } else {
            request_model
        }
    }

    pub fn build_request(&self, request: &GenerateContentRequest) -> GeminiGenerateRequest {
        convert::build_generate_request(request)
    }
}
