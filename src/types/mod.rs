//! Canonical types shared by every adapter

pub mod common;
pub mod content;
pub mod embedding;
pub mod request;
pub mod response;

pub use common::{FinishReason, MessageRole, Role};
pub use content::{Blob, ChatMessage, Content, FunctionCall, FunctionResponse, Part, concat_text};
pub use embedding::{ContentEmbedding, CountTokensResponse, EmbedContentResponse};
pub use request::{
    CountTokensRequest, EmbedContentRequest, FunctionDeclaration, GenerateContentRequest,
    GenerationConfig, Tool,
};
pub use response::{
    Candidate, GenerateContentResponse, PartialResponse, PromptFeedback, UsageMetadata,
};
