//! Gemini streaming implementation using eventsource-stream
//!
//! `:streamGenerateContent?alt=sse` sends one complete
//! `GenerateContentResponse` per event, so each frame maps to exactly one
//! increment.

use crate::streaming::SseFrameConverter;
use crate::types::{GenerateContentResponse, PartialResponse};

use super::convert::normalize_response;

#[derive(Debug, Default)]
pub struct GeminiStreamConverter;

impl SseFrameConverter for GeminiStreamConverter {
    type Frame = GenerateContentResponse;

    fn convert(&mut self, frame: GenerateContentResponse) -> Vec<PartialResponse> {
        vec![normalize_response(frame, false)]
    }
}
