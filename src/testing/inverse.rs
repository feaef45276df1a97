//! The inverse of the Fn encapsulation, playing the Fn server's part.
//!
//! # Responsibilities
//! - Wrap a conventional request into a `POST /call` with `fn-http-*` headers
//! - Check that an encoded response honours the Fn contract
//! - Unwrap the encoded response back into the application's response
//!
//! # Design Decisions
//! - Contract checks return [`ContractViolation`] instead of panicking, so
//!   a harness decides whether a violation fails the test
//! - Keys are compared ignoring ASCII case, as the Fn server does

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::protocol::headers::{is_content_type, prefix_key, starts_with_ignore_case, strip_prefix};
use crate::protocol::{
    is_allowed_status, Connection, Event, HeaderList, ResponseStart, CALL_METHOD, CALL_PATH,
    CONTENT_TYPE, FN_HTTP_H_, FN_HTTP_METHOD, FN_HTTP_REQUEST_URL, FN_HTTP_STATUS,
};
use crate::translate::{EventSink, EventSource, Handler, TranslateResult};

/// Origin used when none is given.
pub const DEFAULT_ORIGIN: &str = "http://testclient";

/// An encoded response the Fn server would not accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
    #[error("content-type header missing")]
    MissingContentType,

    #[error("content-type header must not be prefixed")]
    PrefixedContentType,

    #[error("status {0} is not allowed by the Fn server")]
    UnexpectedStatus(u16),

    #[error("fn-http-status header missing")]
    MissingStatusHeader,

    #[error("fn-http-status header cannot be parsed as an integer: {0:?}")]
    StatusHeaderUnparseable(String),

    #[error("header {0:?} is neither content-type nor an fn- header")]
    UnprefixedHeader(String),
}

/// Encapsulates requests and decapsulates responses.
#[derive(Debug, Clone)]
pub struct InverseTransform {
    origin: String,
}

impl Default for InverseTransform {
    fn default() -> Self {
        Self::new(DEFAULT_ORIGIN)
    }
}

impl InverseTransform {
    /// Create a transform that builds request URLs under `origin`, e.g.
    /// `https://example.com`. A trailing `/` is ignored.
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.trim_end_matches('/').to_string(),
        }
    }

    /// Value of the `fn-http-request-url` header for `connection`.
    pub fn request_url(&self, connection: &Connection) -> Bytes {
        let path: &[u8] = if connection.raw_path.is_empty() {
            connection.path.as_bytes()
        } else {
            &connection.raw_path
        };

        let mut url = BytesMut::with_capacity(
            self.origin.len() + path.len() + connection.query_string.len() + 1,
        );
        url.put_slice(self.origin.as_bytes());
        url.put_slice(path);
        if !connection.query_string.is_empty() {
            url.put_u8(b'?');
            url.put_slice(&connection.query_string);
        }
        url.freeze()
    }

    /// Wrap a conventional request the way the Fn server does.
    pub fn encapsulate(&self, connection: Connection) -> Connection {
        if !connection.is_http() {
            return connection;
        }

        let mut headers = HeaderList::with_capacity(connection.headers.len() + 2);
        headers.push(FN_HTTP_REQUEST_URL, self.request_url(&connection));
        headers.push(FN_HTTP_METHOD, connection.method.as_bytes());

        for (key, value) in connection.headers {
            if is_content_type(&key) {
                headers.push_bytes(key, value);
            } else {
                headers.push_bytes(prefix_key(&key), value);
            }
        }

        Connection {
            method: CALL_METHOD.to_string(),
            path: CALL_PATH.to_string(),
            raw_path: Bytes::from_static(CALL_PATH.as_bytes()),
            query_string: Bytes::new(),
            root_path: String::new(),
            headers,
            ..connection
        }
    }

    /// Check an encoded response start and restore the application's.
    pub fn decapsulate(&self, start: ResponseStart) -> Result<ResponseStart, ContractViolation> {
        let ResponseStart {
            status,
            mut headers,
        } = start;

        if !headers.contains(CONTENT_TYPE) {
            return Err(ContractViolation::MissingContentType);
        }
        if headers.iter().any(|(key, _)| is_prefixed_content_type(key)) {
            return Err(ContractViolation::PrefixedContentType);
        }
        if !is_allowed_status(status) {
            return Err(ContractViolation::UnexpectedStatus(status));
        }

        let carried = headers
            .remove(FN_HTTP_STATUS)
            .ok_or(ContractViolation::MissingStatusHeader)?;
        let status = std::str::from_utf8(&carried)
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .ok_or_else(|| {
                ContractViolation::StatusHeaderUnparseable(
                    String::from_utf8_lossy(&carried).into_owned(),
                )
            })?;

        if let Some((key, _)) = headers
            .iter()
            .find(|(key, _)| !is_content_type(key) && !starts_with_ignore_case(key, b"fn-"))
        {
            return Err(ContractViolation::UnprefixedHeader(
                String::from_utf8_lossy(key).into_owned(),
            ));
        }

        let headers = headers
            .into_iter()
            .map(|(key, value)| (strip_prefix(&key).unwrap_or(key), value))
            .collect::<Vec<_>>()
            .into();

        Ok(ResponseStart { status, headers })
    }
}

fn is_prefixed_content_type(key: &[u8]) -> bool {
    starts_with_ignore_case(key, FN_HTTP_H_) && is_content_type(&key[FN_HTTP_H_.len()..])
}

/// Sink that decapsulates response starts before passing them on.
pub struct DecapsulatingSink<'a, S> {
    inner: &'a mut S,
    transform: &'a InverseTransform,
}

impl<'a, S: EventSink> DecapsulatingSink<'a, S> {
    pub fn new(inner: &'a mut S, transform: &'a InverseTransform) -> Self {
        Self { inner, transform }
    }
}

impl<S: EventSink> EventSink for DecapsulatingSink<'_, S> {
    async fn send(&mut self, event: Event) -> TranslateResult<()> {
        match event {
            Event::Start(start) => {
                let start = self.transform.decapsulate(start)?;
                self.inner.send(Event::Start(start)).await
            }
            other => self.inner.send(other).await,
        }
    }
}

/// A handler that expects Fn calls, driven with conventional requests.
///
/// `Inverted<Translator<App>>` behaves like `App` as long as the
/// translator keeps the Fn contract.
pub struct Inverted<H> {
    transform: InverseTransform,
    inner: H,
}

impl<H: Handler> Inverted<H> {
    pub fn new(inner: H, transform: InverseTransform) -> Self {
        Self { transform, inner }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H: Handler> Handler for Inverted<H> {
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
            return self.inner.call(connection, source, sink).await;
        }

        let encapsulated = self.transform.encapsulate(connection);
        let mut sink = DecapsulatingSink::new(sink, &self.transform);
        self.inner.call(encapsulated, source, &mut sink).await
    }
}
