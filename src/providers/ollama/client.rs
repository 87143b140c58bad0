//! Ollama Client Implementation

use async_trait::async_trait;

use crate::error::LlmError;
use crate::generator::{ContentGenerator, estimate_token_count, unsupported_embeddings};
use crate::streaming::ResponseStream;
use crate::transport::HttpTransport;
use crate::types::{
    CountTokensRequest, CountTokensResponse, EmbedContentRequest, EmbedContentResponse,
    GenerateContentRequest, GenerateContentResponse,
};

use super::streaming::decode_ndjson_stream;
use super::transformers::transform_response;
use super::types::OllamaChatResponse;
use super::{CHAT_PATH, OLLAMA_BACKEND, OllamaProvider};

/// [`ContentGenerator`] backed by a local Ollama server.
#[derive(Debug)]
pub struct OllamaContentGenerator {
    provider: OllamaProvider,
    transport: HttpTransport,
}

impl OllamaContentGenerator {
    pub fn new(provider: OllamaProvider) -> Result<Self, LlmError> {
        let transport = provider.build_client()?;
        Ok(Self {
            provider,
            transport,
        })
    }

    pub fn provider(&self) -> &OllamaProvider {
        &self.provider
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }
}

#[async_trait]
impl ContentGenerator for OllamaContentGenerator {
    fn backend(&self) -> &'static str {
        OLLAMA_BACKEND
    }

    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let body = self.provider.build_request(&request, false);
        tracing::debug!(
            backend = OLLAMA_BACKEND,
            url = %self.transport.url(CHAT_PATH),
            model = %body.model,
            prompt_id = %request.prompt_id,
            "generate_content"
        );
        let response: OllamaChatResponse = self.transport.post_for_json(CHAT_PATH, &body).await?;
        Ok(transform_response(response))
    }

    async fn generate_content_stream(
        &self,
        request: GenerateContentRequest,
    ) -> Result<ResponseStream, LlmError> {
        let body = self.provider.build_request(&request, true);
        tracing::debug!(
            backend = OLLAMA_BACKEND,
            url = %self.transport.url(CHAT_PATH),
            model = %body.model,
            prompt_id = %request.prompt_id,
            "generate_content_stream"
        );
        let response = self.transport.post_json(CHAT_PATH, &body).await?;
        Ok(decode_ndjson_stream(response.bytes_stream()))
    }

    async fn count_tokens(
        &self,
        request: CountTokensRequest,
    ) -> Result<CountTokensResponse, LlmError> {
        Ok(CountTokensResponse {
            total_tokens: estimate_token_count(&request.contents),
        })
    }

    async fn embed_content(
        &self,
        request: EmbedContentRequest,
    ) -> Result<EmbedContentResponse, LlmError> {
        Ok(unsupported_embeddings(&request.contents))
    }
}
