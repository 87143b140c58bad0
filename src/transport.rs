//! HTTP transport handle
//!
//! [`HttpTransport`] is what an adapter's `build_client` produces: a reqwest
//! client bound to one base URL, credentials, timeout and retry budget.
//! Retries happen here and only here, around the send step; a response whose
//! body has started streaming is never retried.

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::LlmError;
use crate::utils::http_headers::HttpHeaderBuilder;

/// How the transport authenticates.
#[derive(Debug)]
pub enum TransportAuth {
    /// `Authorization: Bearer <token>`
    Bearer(SecretString),
    /// Key sent in a named header, e.g. `x-goog-api-key`.
    KeyHeader {
        header: &'static str,
        key: SecretString,
    },
    None,
}

/// Everything needed to build an [`HttpTransport`].
#[derive(Debug)]
pub struct TransportSettings {
    pub backend: &'static str,
    pub base_url: String,
    pub auth: TransportAuth,
    pub timeout: Duration,
    pub max_retries: u32,
    pub default_headers: HeaderMap,
}

/// A configured HTTP binding to one backend.
#[derive(Debug)]
pub struct HttpTransport {
    backend: &'static str,
    client: reqwest::Client,
    base_url: String,
    auth: TransportAuth,
    timeout: Duration,
    max_retries: u32,
    default_headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(settings: TransportSettings) -> Result<Self, LlmError> {
        let TransportSettings {
            backend,
            base_url,
            auth,
            timeout,
            max_retries,
            default_headers,
        } = settings;

        let mut builder = HttpHeaderBuilder::new().with_json_content_type();
        builder = match &auth {
            TransportAuth::Bearer(token) => builder.with_bearer_auth(token.expose_secret())?,
            TransportAuth::KeyHeader { header, key } => {
                builder.with_custom_auth(header, key.expose_secret())?
            }
            TransportAuth::None => builder,
        };
        let headers = builder.with_header_map(default_headers.clone()).build();

        // Idle reads only. Whole-request deadlines are set per call.
        let client = reqwest::Client::builder()
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .read_timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                LlmError::ConfigurationError(format!("failed to build {backend} HTTP client: {e}"))
            })?;

        Ok(Self {
            backend,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth,
            timeout,
            max_retries,
            default_headers,
        })
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth(&self) -> &TransportAuth {
        &self.auth
    }

    /// The API key or token in use, if any.
    pub fn api_key(&self) -> Option<&SecretString> {
        match &self.auth {
            TransportAuth::Bearer(token) => Some(token),
            TransportAuth::KeyHeader { key, .. } => Some(key),
            TransportAuth::None => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Adapter headers (identification and extras), without auth.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// `{base_url}/{path}`
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// POST a JSON body and return the successful response with its body unread.
    ///
    /// Used for streamed responses, so no overall deadline applies; each read
    /// of the body is bounded by the client's read timeout instead.
    ///
    /// Connection failures, timeouts, 429 and 5xx are retried with exponential
    /// backoff up to `max_retries` times. Anything else fails immediately.
    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<reqwest::Response, LlmError>
    where
        B: Serialize + Sync + ?Sized,
    {
        self.post_with_deadline(path, body, None).await
    }

    async fn post_with_deadline<B>(
        &self,
        path: &str,
        body: &B,
        deadline: Option<Duration>,
    ) -> Result<reqwest::Response, LlmError>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.url(path);
        let url = url.as_str();
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(8))
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();

        let this = self;
        let mut attempt = 0u32;
        backoff::future::retry(backoff, move || {
            attempt += 1;
            let current = attempt;
            async move {
                match this.send_once(url, body, deadline).await {
                    Ok(response) => Ok(response),
                    Err(e) if e.is_retryable() && current <= this.max_retries => {
                        tracing::warn!(
                            backend = this.backend,
                            url,
                            attempt = current,
                            error = %e,
                            "retrying request"
                        );
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }

    /// POST a JSON body and decode a JSON response.
    ///
    /// The whole exchange, body included, must finish within `timeout`.
    pub async fn post_for_json<B, T>(&self, path: &str, body: &B) -> Result<T, LlmError>
    where
        B: Serialize + Sync + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .post_with_deadline(path, body, Some(self.timeout))
            .await?;
        let url = response.url().to_string();
        let text = response
            .text()
            .await
            .map_err(|source| LlmError::TransportError {
                backend: self.backend,
                url: url.clone(),
                source,
            })?;
        serde_json::from_str(&text).map_err(|e| {
            LlmError::ParseError(format!(
                "invalid {} response from {url}: {e}",
                self.backend
            ))
        })
    }

    async fn send_once<B>(
        &self,
        url: &str,
        body: &B,
        deadline: Option<Duration>,
    ) -> Result<reqwest::Response, LlmError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!(backend = self.backend, url, "sending request");
        let mut request = self.client.post(url).json(body);
        if let Some(deadline) = deadline {
            request = request.timeout(deadline);
        }
        let response = request
            .send()
            .await
            .map_err(|source| LlmError::TransportError {
                backend: self.backend,
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(LlmError::ApiError {
            code: status.as_u16(),
            message: format!("{} API error {status} at {url}: {text}", self.backend),
            details: serde_json::from_str(&text).ok(),
        })
    }
}
