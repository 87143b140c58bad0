//! Content generator facade
//!
//! [`ContentGenerator`] is the single entry point callers use: it takes a
//! canonical request and returns a canonical response, or a lazy stream of
//! increments. [`create_content_generator`] validates the configuration and
//! picks the backend adapter.

use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::AuthMode;
use crate::config::{EnvSnapshot, ProviderConfig};
use crate::error::LlmError;
use crate::registry::{ProviderAdapter, select_adapter};
use crate::streaming::ResponseStream;
use crate::types::{
    Content, ContentEmbedding, CountTokensRequest, CountTokensResponse, EmbedContentRequest,
    EmbedContentResponse, GenerateContentRequest, GenerateContentResponse, concat_text,
};

use crate::providers::gemini::GeminiContentGenerator;
use crate::providers::ollama::OllamaContentGenerator;
use crate::providers::openai_compatible::OpenAiContentGenerator;

/// Backend-agnostic generation interface.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Short backend id used in logs and errors.
    fn backend(&self) -> &'static str;

    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError>;

    /// Start a streamed generation.
    ///
    /// Transport and status errors are returned here; once the stream is
    /// handed out only body read failures surface as items.
    async fn generate_content_stream(
        &self,
        request: GenerateContentRequest,
    ) -> Result<ResponseStream, LlmError>;

    async fn count_tokens(
        &self,
        request: CountTokensRequest,
    ) -> Result<CountTokensResponse, LlmError>;

    async fn embed_content(
        &self,
        request: EmbedContentRequest,
    ) -> Result<EmbedContentResponse, LlmError>;
}

/// `ceil(chars / 4)` over all text parts. An approximation, not a tokenizer.
pub fn estimate_token_count(contents: &[Content]) -> u32 {
    let chars = concat_text(contents).chars().count();
    u32::try_from(chars.div_ceil(4)).unwrap_or(u32::MAX)
}

/// One empty vector per input item, meaning "no embedding support".
pub fn unsupported_embeddings(contents: &[Content]) -> EmbedContentResponse {
    EmbedContentResponse {
        embeddings: contents.iter().map(|_| ContentEmbedding::default()).collect(),
    }
}

/// Build the generator for the effective auth mode.
pub fn create_content_generator(
    config: Arc<ProviderConfig>,
    auth_mode: AuthMode,
    env: &EnvSnapshot,
) -> Result<Box<dyn ContentGenerator>, LlmError> {
    config.validate_config()?;
    let adapter = select_adapter(auth_mode, config, env);
    tracing::debug!(backend = adapter.kind().as_str(), %auth_mode, "selected backend adapter");
    Ok(match adapter {
        ProviderAdapter::Gemini(provider) => Box::new(GeminiContentGenerator::new(provider)?),
        ProviderAdapter::Ollama(provider) => Box::new(OllamaContentGenerator::new(provider)?),
        ProviderAdapter::OpenAiCompatible(provider) => {
            Box::new(OpenAiContentGenerator::new(provider)?)
        }
    })
}

static_assertions::assert_impl_all!(GeminiContentGenerator: Send, Sync);
static_assertions::assert_impl_all!(OllamaContentGenerator: Send, Sync);
static_assertions::assert_impl_all!(OpenAiContentGenerator: Send, Sync);
