//! Cancellation utilities
//!
//! Provides first-class cancellation handles for response streams.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::streaming::ResponseStream;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    fn new(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    /// Request cancellation. The wrapped stream ends at its next poll and
    /// drops the inner stream, which releases the HTTP body reader.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Make a response stream cancellable and return its cancel handle.
pub fn make_cancellable_stream(stream: ResponseStream) -> (ResponseStream, CancelHandle) {
    let flag = Arc::new(AtomicBool::new(false));
    let handle = CancelHandle::new(flag.clone());
    let mut inner = stream;
    let s = async_stream::stream! {
        use futures::StreamExt;
        loop {
            if flag.load(Ordering::SeqCst) { break; }
            match inner.next().await {
                Some(item) => {
                    if flag.load(Ordering::SeqCst) { break; }
                    yield item;
                }
                None => break,
            }
        }
        drop(inner);
    };
    (Box::pin(s), handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, GenerateContentResponse};
    use futures::StreamExt;

    fn increments(n: usize) -> ResponseStream {
        let items: Vec<_> = (0..n)
            .map(|i| {
                Ok(GenerateContentResponse::from_candidate(Candidate::model_text(
                    i.to_string(),
                    None,
                )))
            })
            .collect();
        Box::pin(futures::stream::iter(items))
    }

    #[tokio::test]
    async fn cancel_stops_the_stream() {
        let (mut stream, handle) = make_cancellable_stream(increments(5));
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.text().as_deref(), Some("0"));
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn uncancelled_stream_passes_everything_through() {
        let (stream, _handle) = make_cancellable_stream(increments(3));
        let all: Vec<_> = stream.collect().await;
        assert_eq!(all.len(), 3);
    }
}
