//! Ollama Streaming Implementation
//!
//! The chat endpoint streams newline-delimited JSON objects. Bytes are
//! buffered until a `\n` arrives, so a frame (or a multi-byte character) split
//! across network chunks is reassembled before it is parsed.

use futures::{Stream, StreamExt};

use crate::error::LlmError;
use crate::streaming::ResponseStream;
use crate::types::{
    Candidate, FinishReason, GenerateContentResponse, PartialResponse, UsageMetadata,
};

use super::OLLAMA_BACKEND;
use super::types::OllamaStreamFrame;

/// Bytes received but not yet split into lines. Owned by exactly one stream.
#[derive(Debug, Default)]
pub struct StreamDecodeState {
    buffer: Vec<u8>,
}

impl StreamDecodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line, without its terminator.
    ///
    /// The trailing partial line (possibly empty) stays buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// End of input. The unterminated remainder is discarded, never parsed;
    /// returns how many bytes were dropped.
    pub fn finish(self) -> usize {
        self.buffer.len()
    }
}

/// What a single line turned into.
#[derive(Debug)]
pub enum LineOutcome {
    Increment(PartialResponse),
    /// Blank line, or a frame without any text.
    Ignored,
    Malformed(serde_json::Error),
}

/// Parse one complete line.
pub fn decode_line(line: &[u8]) -> LineOutcome {
    if line.iter().all(u8::is_ascii_whitespace) {
        return LineOutcome::Ignored;
    }
    match serde_json::from_slice::<OllamaStreamFrame>(line) {
        Ok(frame) => {
            frame_to_increment(frame).map_or(LineOutcome::Ignored, LineOutcome::Increment)
        }
        Err(e) => LineOutcome::Malformed(e),
    }
}

/// Increment for one frame.
///
/// Finish reason is `STOP` on the `done` frame and absent otherwise. A frame
/// with neither `message` nor legacy `response` text yields nothing unless it
/// is the `done` frame, which always closes the stream with a finish reason.
pub fn frame_to_increment(frame: OllamaStreamFrame) -> Option<PartialResponse> {
    let text = match (frame.message, frame.response) {
        (Some(message), _) => message.content,
        (None, Some(response)) if !response.is_empty() => response,
        _ if frame.done => String::new(),
        _ => return None,
    };
    let finish_reason = frame.done.then_some(FinishReason::Stop);
    let mut out =
        GenerateContentResponse::from_candidate(Candidate::model_text(text, finish_reason));
    if frame.done {
        out.usage_metadata = UsageMetadata::from_counts(frame.prompt_eval_count, frame.eval_count);
    }
    out.model_version = frame.model;
    Some(out)
}

/// Decode a newline-delimited JSON body into canonical increments.
///
/// Malformed lines are logged and skipped. A failed read ends the stream with
/// [`LlmError::StreamError`]. The byte stream is owned by the returned stream,
/// so it is released on completion, on error and when the caller drops it.
pub fn decode_ndjson_stream<S, B, E>(byte_stream: S) -> ResponseStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let s = async_stream::stream! {
        let mut byte_stream = Box::pin(byte_stream);
        let mut state = StreamDecodeState::new();
        let mut skipped = 0usize;
        while let Some(chunk) = byte_stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(LlmError::StreamError(format!(
                        "{OLLAMA_BACKEND} stream read failed: {e}"
                    )));
                    return;
                }
            };
            for line in state.push(chunk.as_ref()) {
                match decode_line(&line) {
                    LineOutcome::Increment(increment) => yield Ok(increment),
                    LineOutcome::Ignored => {}
                    LineOutcome::Malformed(e) => {
                        skipped += 1;
                        tracing::warn!(
                            backend = OLLAMA_BACKEND,
                            error = %e,
                            "skipping malformed stream frame"
                        );
                    }
                }
            }
        }
        let dropped = state.finish();
        if dropped > 0 {
            tracing::debug!(
                backend = OLLAMA_BACKEND,
                bytes = dropped,
                "discarding unterminated trailing line"
            );
        }
        if skipped > 0 {
            tracing::debug!(
                backend = OLLAMA_BACKEND,
                skipped,
                "stream finished with skipped frames"
            );
        }
    };
    Box::pin(s)
}
