//! Responses for calls that fail to decode.
//!
//! These go straight back to the Fn server: the status is sent as is
//! (no allow-list clamp) and no header is prefixed.

use axum::{
    body::Body,
    http::{header, HeaderValue, Response},
};
use bytes::Bytes;

use super::{EventSink, TranslateError};
use crate::protocol::{Connection, Event, HeaderList, ProtocolError, CONTENT_TYPE};

const TEXT_PLAIN: &str = "text/plain";

fn log_rejection(error: &ProtocolError, method: &str, path: &str) {
    tracing::error!(
        error = %error,
        status = error.status().as_u16(),
        method = %method,
        path = %path,
        "Rejected malformed Fn call"
    );
}

/// Answer a failed decode on the event interface: one start event with a
/// `text/plain` content type, then the message as the only body chunk.
pub async fn respond_error<S: EventSink>(
    error: &ProtocolError,
    connection: &Connection,
    sink: &mut S,
) -> Result<(), TranslateError> {
    log_rejection(error, &connection.method, &connection.path);

    let mut headers = HeaderList::with_capacity(1);
    headers.push(CONTENT_TYPE, TEXT_PLAIN);

    sink.send(Event::start(error.status().as_u16(), headers))
        .await?;
    sink.send(Event::body(Bytes::from(error.to_string()), false))
        .await
}

/// Same as [`respond_error`], as an HTTP response.
pub fn error_response(error: &ProtocolError, method: &str, path: &str) -> Response<Body> {
    log_rejection(error, method, path);

    let mut response = Response::new(Body::from(error.to_string()));
    *response.status_mut() = error.status();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    response
}
