//! Streaming plumbing shared by the adapters
//!
//! Every adapter hands its caller a [`ResponseStream`]: a lazy, finite,
//! non-restartable sequence of [`PartialResponse`]s in frame order. The
//! stream owns the HTTP body; dropping it at any point releases the reader.
//!
//! Malformed frames are skipped and logged, never surfaced. Only a failure to
//! read the body itself ends the stream with an error.

use std::pin::Pin;

use eventsource_stream::{EventStreamError, Eventsource};
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::error::LlmError;
use crate::types::PartialResponse;

/// Lazy sequence of canonical increments.
pub type ResponseStream = Pin<Box<dyn Stream<Item = Result<PartialResponse, LlmError>> + Send>>;

/// Converts one decoded SSE payload into zero or more increments.
///
/// Converters are owned by a single stream, so they may keep state across frames.
pub trait SseFrameConverter: Send + 'static {
    type Frame: DeserializeOwned + Send;

    fn convert(&mut self, frame: Self::Frame) -> Vec<PartialResponse>;

    /// Called once when the `[DONE]` sentinel or the end of the body is reached.
    fn handle_stream_end(&mut self) -> Vec<PartialResponse> {
        Vec::new()
    }
}

/// Builds [`ResponseStream`]s from raw byte streams.
pub struct StreamFactory;

impl StreamFactory {
    /// Decode a server-sent-events body whose `data:` payloads are JSON frames.
    pub fn create_sse_stream<S, B, E, C>(
        backend: &'static str,
        byte_stream: S,
        mut converter: C,
    ) -> ResponseStream
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
        C: SseFrameConverter,
    {
        let s = async_stream::stream! {
            let mut events = Box::pin(byte_stream.eventsource());
            let mut skipped = 0usize;
            while let Some(event) = events.next().await {
                let event = match event {
                    Ok(event) => event,
                    Err(EventStreamError::Transport(e)) => {
                        yield Err(LlmError::StreamError(format!(
                            "{backend} stream read failed: {e}"
                        )));
                        return;
                    }
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(backend, error = %e, "skipping undecodable SSE event");
                        continue;
                    }
                };
                let data = event.data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == "[DONE]" {
                    break;
                }
                match serde_json::from_str::<C::Frame>(data) {
                    Ok(frame) => {
                        for increment in converter.convert(frame) {
                            yield Ok(increment);
                        }
                    }
                    Err(e) => {
                        skipped += 1;
                        tracing::warn!(backend, error = %e, "skipping malformed stream frame");
                    }
                }
            }
            for increment in converter.handle_stream_end() {
                yield Ok(increment);
            }
            if skipped > 0 {
                tracing::debug!(backend, skipped, "stream finished with skipped frames");
            }
        };
        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, GenerateContentResponse};

    #[derive(serde::Deserialize)]
    struct TextFrame {
        text: String,
    }

    struct TextConverter;

    impl SseFrameConverter for TextConverter {
        type Frame = TextFrame;

        fn convert(&mut self, frame: TextFrame) -> Vec<PartialResponse> {
            vec![GenerateContentResponse::from_candidate(Candidate::model_text(
                frame.text, None,
            ))]
        }
    }

    fn chunks(parts: &[&str]) -> Vec<Result<Vec<u8>, std::io::Error>> {
        parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect()
    }

    #[tokio::test]
    async fn sse_frames_split_across_chunks_and_malformed_skipped() {
        let body = chunks(&[
            "data: {\"text\":\"a\"}\n\ndata: {\"te",
            "xt\":\"b\"}\n\ndata: nope\n\n",
            "data: {\"text\":\"c\"}\n\ndata: [DONE]\n\n",
        ]);
        let stream = StreamFactory::create_sse_stream(
            "test",
            futures::stream::iter(body),
            TextConverter,
        );
        let texts: Vec<_> = stream
            .map(|r| r.unwrap().text().unwrap())
            .collect()
            .await;
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn stream_can_be_drained_on_another_task() {
        let body = chunks(&["data: {\"text\":\"a\"}\n\n", "data: {\"text\":\"b\"}\n\n"]);
        let stream = StreamFactory::create_sse_stream(
            "test",
            futures::stream::iter(body),
            TextConverter,
        );
        let texts = tokio::spawn(async move {
            stream
                .map(|r| r.unwrap().text().unwrap())
                .collect::<Vec<_>>()
                .await
        })
        .await
        .unwrap();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn transport_failure_ends_stream_with_error() {
        let body: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(b"data: {\"text\":\"a\"}\n\n".to_vec()),
            Err(std::io::Error::other("reset")),
            Ok(b"data: {\"text\":\"never\"}\n\n".to_vec()),
        ];
        let stream = StreamFactory::create_sse_stream(
            "test",
            futures::stream::iter(body),
            TextConverter,
        );
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(LlmError::StreamError(_))));
    }
}
