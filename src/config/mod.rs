//! Provider configuration
//!
//! [`ProviderConfig`] is produced once per session by the host application's
//! settings layer and shared read-only (behind an `Arc`) with every adapter.

pub mod env;

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use validator::Validate;

use crate::error::LlmError;

pub use env::EnvSnapshot;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Default number of transport-level retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Connection settings for one backend.
#[derive(Debug, Validate)]
pub struct ProviderConfig {
    /// API key. Keyless local backends get a placeholder instead.
    pub api_key: Option<SecretString>,
    /// OAuth bearer token obtained by an external login flow.
    pub access_token: Option<SecretString>,
    /// Overrides the adapter's default endpoint.
    #[validate(url)]
    pub base_url: Option<String>,
    pub model: String,
    pub timeout: Duration,
    #[validate(range(max = 10))]
    pub max_retries: u32,
    /// Host application version, reported in the identification header.
    pub client_version: Option<String>,
    /// Sent with every request on top of the adapter's headers.
    pub extra_headers: HashMap<String, String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            access_token: None,
            base_url: None,
            model: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            client_version: None,
            extra_headers: HashMap::new(),
        }
    }
}

impl ProviderConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = Some(version.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    /// Base URL with empty strings treated as unset.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn validate_config(&self) -> Result<(), LlmError> {
        self.validate()
            .map_err(|e| LlmError::ConfigurationError(format!("invalid provider config: {e}")))
    }
}
