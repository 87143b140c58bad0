//! OpenAI-compatible client

use async_trait::async_trait;

use crate::error::LlmError;
use crate::generator::{ContentGenerator, estimate_token_count};
use crate::streaming::{ResponseStream, StreamFactory};
use crate::transport::HttpTransport;
use crate::types::{
    ContentEmbedding, CountTokensRequest, CountTokensResponse, EmbedContentRequest,
    EmbedContentResponse, GenerateContentRequest, GenerateContentResponse,
};

use super::streaming::OpenAiStreamConverter;
use super::transformers::transform_response;
use super::types::{ChatCompletionResponse, EmbeddingRequest, EmbeddingResponse};
use super::{
    CHAT_COMPLETIONS_PATH, EMBEDDINGS_PATH, OPENAI_COMPATIBLE_BACKEND, OpenAiCompatibleProvider,
};

/// [`ContentGenerator`] for any OpenAI-compatible server.
#[derive(Debug)]
pub struct OpenAiContentGenerator {
    provider: OpenAiCompatibleProvider,
    transport: HttpTransport,
}

impl OpenAiContentGenerator {
    pub fn new(provider: OpenAiCompatibleProvider) -> Result<Self, LlmError> {
        let transport = provider.build_client()?;
        Ok(Self {
            provider,
            transport,
        })
    }

    pub fn provider(&self) -> &OpenAiCompatibleProvider {
        &self.provider
    }
}

#[async_trait]
impl ContentGenerator for OpenAiContentGenerator {
    fn backend(&self) -> &'static str {
        OPENAI_COMPATIBLE_BACKEND
    }

    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let body = self.provider.build_request(&request, false);
        tracing::debug!(
            backend = OPENAI_COMPATIBLE_BACKEND,
            url = %self.transport.url(CHAT_COMPLETIONS_PATH),
            model = %body.model,
            prompt_id = %request.prompt_id,
            "generate_content"
        );
        let response: ChatCompletionResponse = self
            .transport
            .post_for_json(CHAT_COMPLETIONS_PATH, &body)
            .await?;
        transform_response(response)
    }

    async fn generate_content_stream(
        &self,
        request: GenerateContentRequest,
    ) -> Result<ResponseStream, LlmError> {
        let body = self.provider.build_request(&request, true);
        tracing::debug!(
            backend = OPENAI_COMPATIBLE_BACKEND,
            url = %self.transport.url(CHAT_COMPLETIONS_PATH),
            model = %body.model,
            prompt_id = %request.prompt_id,
            "generate_content_stream"
        );
        let response = self.transport.post_json(CHAT_COMPLETIONS_PATH, &body).await?;
        Ok(StreamFactory::create_sse_stream(
            OPENAI_COMPATIBLE_BACKEND,
            response.bytes_stream(),
            OpenAiStreamConverter::new(),
        ))
    }

    /// No counting endpoint in the protocol; uses the character estimate.
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
        let body = EmbeddingRequest {
            model: self.provider.model_for(&request.model).to_string(),
            input: request.contents.iter().map(|c| c.text()).collect(),
        };
        let response: EmbeddingResponse =
            self.transport.post_for_json(EMBEDDINGS_PATH, &body).await?;
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        Ok(EmbedContentResponse {
            embeddings: data
                .into_iter()
                .map(|d| ContentEmbedding {
                    values: d.embedding,
                })
                .collect(),
        })
    }
}
