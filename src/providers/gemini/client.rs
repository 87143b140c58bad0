//! Gemini Client Implementation

use async_trait::async_trait;

use crate::error::LlmError;
use crate::generator::ContentGenerator;
use crate::streaming::{ResponseStream, StreamFactory};
use crate::transport::HttpTransport;
use crate::types::{
    CountTokensRequest, CountTokensResponse, EmbedContentRequest, EmbedContentResponse,
    GenerateContentRequest, GenerateContentResponse,
};

use super::convert::{model_path_segment, normalize_response};
use super::streaming::GeminiStreamConverter;
use super::types::{GeminiBatchEmbedRequest, GeminiCountTokensRequest, GeminiEmbedRequest};
use super::{GEMINI_BACKEND, GeminiProvider};

/// [`ContentGenerator`] for the Gemini API and Vertex AI.
#[derive(Debug)]
pub struct GeminiContentGenerator {
    provider: GeminiProvider,
    transport: HttpTransport,
}

impl GeminiContentGenerator {
    pub fn new(provider: GeminiProvider) -> Result<Self, LlmError> {
        let transport = provider.build_client()?;
        Ok(Self {
            provider,
            transport,
        })
    }

    pub fn provider(&self) -> &GeminiProvider {
        &self.provider
    }

    /// `models/{model}:{method}`
    fn method_path(&self, model: &str, method: &str) -> String {
        format!(
            "models/{}:{method}",
            model_path_segment(self.provider.model_for(model))
        )
    }
}

#[async_trait]
impl ContentGenerator for GeminiContentGenerator {
    fn backend(&self) -> &'static str {
        GEMINI_BACKEND
    }

    async fn generate_content(
        &self,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, LlmError> {
        let path = self.method_path(&request.model, "generateContent");
        let body = self.provider.build_request(&request);
        tracing::debug!(
            backend = GEMINI_BACKEND,
            url = %self.transport.url(&path),
            prompt_id = %request.prompt_id,
            "generate_content"
        );
        let response: GenerateContentResponse = self.transport.post_for_json(&path, &body).await?;
        Ok(normalize_response(response, true))
    }

    async fn generate_content_stream(
        &self,
        request: GenerateContentRequest,
    ) -> Result<ResponseStream, LlmError> {
        let path = self.method_path(&request.model, "streamGenerateContent?alt=sse");
        let body = self.provider.build_request(&request);
        tracing::debug!(
            backend = GEMINI_BACKEND,
            url = %self.transport.url(&path),
            prompt_id = %request.prompt_id,
            "generate_content_stream"
        );
        let response = self.transport.post_json(&path, &body).await?;
        Ok(StreamFactory::create_sse_stream(
            GEMINI_BACKEND,
            response.bytes_stream(),
            GeminiStreamConverter,
        ))
    }

    async fn count_tokens(
        &self,
        request: CountTokensRequest,
    ) -> Result<CountTokensResponse, LlmError> {
        let path = self.method_path(&request.model, "countTokens");
        let body = GeminiCountTokensRequest {
            contents: request.contents,
        };
        self.transport.post_for_json(&path, &body).await
    }

    async fn embed_content(
        &self,
        request: EmbedContentRequest,
    ) -> Result<EmbedContentResponse, LlmError> {
        let path = self.method_path(&request.model, "batchEmbedContents");
        let model = format!(
            "models/{}",
            self.provider
                .model_for(&request.model)
                .trim_start_matches("models/")
        );
        let body = GeminiBatchEmbedRequest {
            requests: request
                .contents
                .into_iter()
                .map(|content| GeminiEmbedRequest {
                    model: model.clone(),
                    content,
                })
                .collect(),
        };
        self.transport.post_for_json(&path, &body).await
    }
}
