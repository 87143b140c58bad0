//! Authentication mode resolution and validation.
//!
//! Resolution is a pure function of the configured mode and an
//! [`EnvSnapshot`]. Validation then checks the chosen mode against the
//! credentials that are actually available, and a single refresh step is run
//! before any generation call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;
use crate::config::env::{
    EnvSnapshot, GEMINI_API_KEY, GOOGLE_API_KEY, GOOGLE_CLOUD_LOCATION, GOOGLE_CLOUD_PROJECT,
    GOOGLE_GENAI_USE_GCA, GOOGLE_GENAI_USE_VERTEXAI, OLLAMA_HOST, OPENAI_API_KEY, OPENAI_BASE_URL,
};
use crate::error::LlmError;

/// Variables named in the "no auth method" report.
pub const REQUIRED_AUTH_ENV_VARS: [&str; 4] = [
    GEMINI_API_KEY,
    OPENAI_API_KEY,
    GOOGLE_GENAI_USE_VERTEXAI,
    GOOGLE_GENAI_USE_GCA,
];

/// Supported authentication strategies. Exactly one is effective per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthMode {
    /// Hosted Google login; credentials are obtained by an external flow.
    #[serde(rename = "oauth-personal")]
    LoginWithGoogle,
    #[serde(rename = "vertex-ai")]
    UseVertexAi,
    #[serde(rename = "gemini-api-key")]
    UseGemini,
    /// Any OpenAI-compatible endpoint, including a local Ollama server.
    #[serde(rename = "openai")]
    UseOpenAi,
}

impl AuthMode {
    /// Modes served by the Gemini-style adapter.
    pub const fn is_google(&self) -> bool {
        matches!(
            self,
            Self::LoginWithGoogle | Self::UseVertexAi | Self::UseGemini
        )
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::LoginWithGoogle => "oauth-personal",
            Self::UseVertexAi => "vertex-ai",
            Self::UseGemini => "gemini-api-key",
            Self::UseOpenAi => "openai",
        })
    }
}

/// Auth mode implied by the environment alone, highest priority first.
pub fn auth_mode_from_env(env: &EnvSnapshot) -> Option<AuthMode> {
    if env.flag(GOOGLE_GENAI_USE_GCA) {
        return Some(AuthMode::LoginWithGoogle);
    }
    if env.flag(GOOGLE_GENAI_USE_VERTEXAI) {
        return Some(AuthMode::UseVertexAi);
    }
    if env.is_set(GEMINI_API_KEY) {
        return Some(AuthMode::UseGemini);
    }
    // A local Ollama server speaks the OpenAI-compatible protocol without a key.
    if env.is_set(OLLAMA_HOST) || env.is_set(OPENAI_BASE_URL) || env.is_set(OPENAI_API_KEY) {
        return Some(AuthMode::UseOpenAi);
    }
    None
}

/// Environment signals win; the configured mode is the last resort.
///
/// `None` means no mode is resolvable, which callers must treat as fatal.
pub fn resolve_effective_auth(
    configured: Option<AuthMode>,
    env: &EnvSnapshot,
) -> Option<AuthMode> {
    auth_mode_from_env(env).or(configured)
}

/// Check that the credentials required by `mode` are present.
pub fn validate_auth_method(
    mode: AuthMode,
    env: &EnvSnapshot,
    config: &ProviderConfig,
) -> Result<(), LlmError> {
    match mode {
        AuthMode::LoginWithGoogle => Ok(()),
        AuthMode::UseGemini => {
            if env.is_set(GEMINI_API_KEY) || config.api_key.is_some() {
                Ok(())
            } else {
                Err(LlmError::AuthValidation(format!(
                    "{GEMINI_API_KEY} environment variable not found. Add that to your \
                     environment and try again (no reload needed if using .env)!"
                )))
            }
        }
        AuthMode::UseVertexAi => {
            let has_project =
                env.is_set(GOOGLE_CLOUD_PROJECT) && env.is_set(GOOGLE_CLOUD_LOCATION);
            if has_project || env.is_set(GOOGLE_API_KEY) || config.api_key.is_some() {
                Ok(())
            } else {
                Err(LlmError::AuthValidation(format!(
                    "When using Vertex AI, you must specify either:\n\
                     • {GOOGLE_CLOUD_PROJECT} and {GOOGLE_CLOUD_LOCATION} environment \
                     variables.\n\
                     • {GOOGLE_API_KEY} environment variable (if using express mode).\n\
                     Update your environment and try again (no reload needed if using .env)!"
                )))
            }
        }
        AuthMode::UseOpenAi => {
            let keyless_backend = env.is_set(OLLAMA_HOST) || env.is_set(OPENAI_BASE_URL);
            if keyless_backend || env.is_set(OPENAI_API_KEY) || config.api_key.is_some() {
                Ok(())
            } else {
                Err(LlmError::AuthValidation(format!(
                    "{OPENAI_API_KEY} environment variable not found. Set it, or point \
                     {OPENAI_BASE_URL} or {OLLAMA_HOST} at a local server."
                )))
            }
        }
    }
}

/// Downstream dependency updated once the effective mode is known.
#[async_trait]
pub trait AuthRefresher: Send + Sync {
    async fn refresh_auth(&self, mode: AuthMode) -> Result<(), LlmError>;
}

/// Resolve, validate and refresh auth for a non-interactive session.
///
/// Validation is skipped when `use_external_auth` is set (credentials managed
/// upstream, e.g. SSO). The refresher runs exactly once, and only after a mode
/// was resolved and accepted.
pub async fn validate_non_interactive_auth<R>(
    configured: Option<AuthMode>,
    use_external_auth: bool,
    env: &EnvSnapshot,
    config: &ProviderConfig,
    refresher: &R,
) -> Result<AuthMode, LlmError>
where
    R: AuthRefresher + ?Sized,
{
    let mode = resolve_effective_auth(configured, env).ok_or_else(|| LlmError::AuthNotFound {
        env_vars: REQUIRED_AUTH_ENV_VARS.to_vec(),
    })?;

    if !use_external_auth {
        validate_auth_method(mode, env, config)?;
    }

    refresher.refresh_auth(mode).await?;
    tracing::info!(auth_mode = %mode, "authentication resolved");
    Ok(mode)
}
