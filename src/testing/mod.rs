//! Test doubles for driving the translator without a transport.
//!
//! [`Inverted`] and [`InverseTransform`] play the Fn server: they turn a
//! conventional request into a Fn call and check the encoded response.
//! [`inverted`] does the same for an axum [`Router`](axum::Router).
//! [`BufferedSource`] and [`RecordingSink`] stand in for the transport's
//! body stream and response channel.

mod inverse;
mod router;

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

use crate::protocol::{Event, RequestBody, ResponseStart};
use crate::translate::{EventSink, EventSource, TranslateResult};

pub use inverse::{ContractViolation, DecapsulatingSink, InverseTransform, Inverted, DEFAULT_ORIGIN};
pub use router::{decapsulate_response, encapsulate_request, inverted};

/// Request body served from memory, one chunk per call.
#[derive(Debug, Default)]
pub struct BufferedSource {
    chunks: VecDeque<Bytes>,
}

impl BufferedSource {
    pub fn new(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }

    /// A source with no body at all.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl EventSource for BufferedSource {
    async fn receive(&mut self) -> Option<RequestBody> {
        let body = self.chunks.pop_front()?;
        Some(RequestBody {
            body,
            more_body: !self.chunks.is_empty(),
        })
    }
}

/// Sink that keeps every event it is sent.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
}

impl RecordingSink {
    /// The first response start, if any.
    pub fn start(&self) -> Option<&ResponseStart> {
        self.events.iter().find_map(|event| match event {
            Event::Start(start) => Some(start),
            _ => None,
        })
    }

    /// All body chunks concatenated.
    pub fn body(&self) -> Bytes {
        let mut body = BytesMut::new();
        for event in &self.events {
            if let Event::Body(chunk) = event {
                body.extend_from_slice(&chunk.body);
            }
        }
        body.freeze()
    }

    /// True if the last body chunk closed the response.
    pub fn finished(&self) -> bool {
        self.events
            .iter()
            .rev()
            .find_map(|event| match event {
                Event::Body(chunk) => Some(!chunk.more_body),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl EventSink for RecordingSink {
    async fn send(&mut self, event: Event) -> TranslateResult<()> {
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffered_source_flags_last_chunk() {
        let mut source = BufferedSource::new([Bytes::from("a"), Bytes::from("b")]);

        assert_eq!(
            source.receive().await,
            Some(RequestBody { body: Bytes::from("a"), more_body: true })
        );
        assert_eq!(
            source.receive().await,
            Some(RequestBody { body: Bytes::from("b"), more_body: false })
        );
        assert_eq!(source.receive().await, None);
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let mut sink = RecordingSink::default();
        sink.send(Event::start(200, Default::default())).await.unwrap();
        sink.send(Event::body("a", true)).await.unwrap();
        assert!(!sink.finished());
        sink.send(Event::body("b", false)).await.unwrap();

        assert_eq!(sink.start().unwrap().status, 200);
        assert_eq!(sink.body(), Bytes::from("ab"));
        assert!(sink.finished());
    }
}
