//! Translation between Fn calls and a wrapped application.
//!
//! # Data Flow
//! ```text
//! Connection (POST /call)
//!     → decoder.rs (decapsulate)  ──error──→ responder.rs → sink
//!     → Handler (wrapped application)
//!     → encoder.rs (EncodingSink: prefix headers, clamp status, access log)
//!     → sink
//! ```
//!
//! # Design Decisions
//! - The application is reached only through three narrow traits:
//!   [`EventSource`] for request body chunks, [`EventSink`] for response
//!   events and [`Handler`] for the application itself
//! - [`Translator`] wraps any handler by composition and is a handler too
//! - Non-HTTP connections bypass decoding and encoding entirely

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod responder;

use std::future::Future;

use tokio::sync::mpsc;

use crate::config::TranslatorConfig;
use crate::protocol::{Connection, Event, RequestBody};

pub use decoder::RequestDecoder;
pub use encoder::{encode_response_start, AccessRecord, EncodingSink};
pub use error::{TranslateError, TranslateResult};
pub use responder::{error_response, respond_error};

/// Lazy, finite, non-restartable source of request body chunks.
pub trait EventSource: Send {
    /// Next chunk, or `None` once the body is exhausted.
    fn receive(&mut self) -> impl Future<Output = Option<RequestBody>> + Send;
}

/// Destination of response events. Expects one [`Event::Start`] before
/// any [`Event::Body`].
pub trait EventSink: Send {
    fn send(&mut self, event: Event) -> impl Future<Output = TranslateResult<()>> + Send;
}

/// A wrapped application.
pub trait Handler: Send + Sync {
    fn call<R, S>(
        &self,
        connection: Connection,
        source: &mut R,
        sink: &mut S,
    ) -> impl Future<Output = TranslateResult<()>> + Send
    where
        R: EventSource,
        S: EventSink;
}

impl EventSource for mpsc::Receiver<RequestBody> {
    async fn receive(&mut self) -> Option<RequestBody> {
        self.recv().await
    }
}

impl EventSink for mpsc::Sender<Event> {
    async fn send(&mut self, event: Event) -> TranslateResult<()> {
        mpsc::Sender::send(self, event)
            .await
            .map_err(|_| TranslateError::SinkClosed)
    }
}

/// Wraps a handler so that it speaks the Fn protocol.
pub struct Translator<H> {
    handler: H,
    decoder: RequestDecoder,
}

impl<H: Handler> Translator<H> {
    /// Create a translator around `handler`.
    pub fn new(handler: H, config: &TranslatorConfig) -> Self {
        Self {
            handler,
            decoder: RequestDecoder::new(config.root_path.clone()),
        }
    }

    /// Get a reference to the wrapped handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: Handler> Handler for Translator<H> {
    async fn call<R, S>(
        &self,
        connection: Connection,
        source: &mut R,
        sink: &mut S,
    ) -> TranslateResult<()>
    where
        R: EventSource,
        S: EventSink,
    {
        if !connection.is_http() {
            return self.handler.call(connection, source, sink).await;
        }

        let decoded = match self.decoder.decode(&connection) {
            Ok(decoded) => decoded,
            Err(error) => return respond_error(&error, &connection, sink).await,
        };

        tracing::debug!(
            method = %decoded.method,
            path = %decoded.path,
            root_path = %decoded.root_path,
            "Decoded Fn call"
        );

        let mut sink = EncodingSink::new(sink, AccessRecord::new(&decoded));
        self.handler.call(decoded, source, &mut sink).await
    }
}
