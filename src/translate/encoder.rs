//! Response encoding: application response → Fn encapsulated response.
//!
//! # Responsibilities
//! - Prefix every response header except `content-type`
//! - Carry the true status in `fn-http-status`, add `fn-fdk-version`
//! - Clamp the visible status to the Fn allow-list
//! - Enforce start-before-body ordering on the outbound event stream
//! - Emit one access log record per exchange
//!
//! # Design Decisions
//! - Body and trailer events are never inspected or copied
//! - The access log reports the true status and the decoded request,
//!   never the `POST /call` envelope

use std::net::SocketAddr;

use bytes::Bytes;

use super::{EventSink, TranslateError};
use crate::observability::ACCESS_LOG_TARGET;
use crate::protocol::headers::{is_content_type, prefix_key};
use crate::protocol::{
    is_allowed_status, Connection, Event, HeaderList, ResponseStart, DEFAULT_STATUS,
    FDK_VERSION, FN_FDK_VERSION, FN_HTTP_STATUS,
};

/// Rewrite a response start in place for the Fn server. Returns the
/// application's original status.
pub fn encode_response_start(start: &mut ResponseStart) -> u16 {
    let status = start.status;
    let headers = std::mem::take(&mut start.headers);

    let mut encoded = HeaderList::with_capacity(headers.len() + 2);
    for (key, value) in headers {
        if is_content_type(&key) {
            encoded.push_bytes(key, value);
        } else {
            encoded.push_bytes(prefix_key(&key), value);
        }
    }
    encoded.push_bytes(
        Bytes::from_static(FN_HTTP_STATUS),
        Bytes::from(status.to_string()),
    );
    encoded.push_bytes(
        Bytes::from_static(FN_FDK_VERSION),
        Bytes::from_static(FDK_VERSION.as_bytes()),
    );

    start.headers = encoded;
    if !is_allowed_status(status) {
        start.status = DEFAULT_STATUS;
    }

    status
}

/// What the access log needs to know about a decoded request.
#[derive(Debug, Clone)]
pub struct AccessRecord {
    client: Option<SocketAddr>,
    method: String,
    target: String,
    http_version: String,
}

impl AccessRecord {
    pub fn new(connection: &Connection) -> Self {
        Self {
            client: connection.client,
            method: connection.method.clone(),
            target: connection.path_with_query(),
            http_version: connection.http_version.clone(),
        }
    }

    /// Emit the access log line for `status`.
    pub fn log(&self, status: u16) {
        let client = self
            .client
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::info!(
            target: ACCESS_LOG_TARGET,
            client = %client,
            method = %self.method,
            path = %self.target,
            http_version = %self.http_version,
            status,
            "{} - \"{} {} HTTP/{}\" {}",
            client,
            self.method,
            self.target,
            self.http_version,
            status
        );
    }
}

/// Sink wrapper that encodes everything the application sends.
pub struct EncodingSink<'a, S> {
    inner: &'a mut S,
    access: AccessRecord,
    started: bool,
}

impl<'a, S: EventSink> EncodingSink<'a, S> {
    pub fn new(inner: &'a mut S, access: AccessRecord) -> Self {
        Self {
            inner,
            access,
            started: false,
        }
    }

    /// True once the response start has been forwarded.
    pub fn started(&self) -> bool {
        self.started
    }
}

impl<S: EventSink> EventSink for EncodingSink<'_, S> {
    async fn send(&mut self, event: Event) -> Result<(), TranslateError> {
        match event {
            Event::Start(mut start) => {
                if self.started {
                    return Err(TranslateError::DuplicateStart);
                }
                self.started = true;

                let status = encode_response_start(&mut start);
                self.access.log(status);
                self.inner.send(Event::Start(start)).await
            }
            Event::Body(_) | Event::Trailers(_) if !self.started => {
                Err(TranslateError::BodyBeforeStart)
            }
            other => self.inner.send(other).await,
        }
    }
}
