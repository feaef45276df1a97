//! Fn translation as axum middleware.
//!
//! # Responsibilities
//! - Decode each `POST /call` into the request it carries
//! - Rewrite the request in place before the application routes it
//! - Encode the application's response head for the Fn server
//!
//! # Design Decisions
//! - The application is mounted as the fallback service of an outer
//!   router, so the middleware runs before the application's own routing
//! - Bodies stream through untouched in both directions

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, request, HeaderValue, Method, Request, Response, StatusCode, Uri},
    middleware::{self, Next},
    Router,
};

use bytes::Bytes;

use crate::config::TranslatorConfig;
use crate::http::convert::{connection_from_parts, header_list, header_map};
use crate::protocol::{Connection, ProtocolError, ResponseStart};
use crate::translate::{encode_response_start, error_response, AccessRecord, RequestDecoder};

const CARRIED_HOST: &[u8] = b"fn-http-h-host";

/// Mount prefix stripped from the request path, attached as a request
/// extension. Empty when nothing was stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootPath(pub String);

/// Serve `app` as an Fn function.
pub fn translated(app: Router, config: &TranslatorConfig) -> Router {
    let decoder = Arc::new(RequestDecoder::new(config.root_path.clone()));
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn_with_state(decoder, translate))
}

/// Middleware translating one Fn call.
pub async fn translate(
    State(decoder): State<Arc<RequestDecoder>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let (parts, body) = request.into_parts();
    let connection = connection_from_parts(&parts);

    let decoded = match decoder.decode(&connection) {
        Ok(decoded) => decoded,
        Err(error) => return error_response(&error, &connection.method, &connection.path),
    };

    let carried_host = connection.headers.get(CARRIED_HOST).cloned();
    let parts = match rewrite_parts(parts, &decoded, carried_host) {
        Ok(parts) => parts,
        Err(error) => return error_response(&error, &connection.method, &connection.path),
    };

    tracing::debug!(
        method = %decoded.method,
        path = %decoded.path,
        root_path = %decoded.root_path,
        "Decoded Fn call"
    );

    let access = AccessRecord::new(&decoded);
    let response = next.run(Request::from_parts(parts, body)).await;
    encode_response(response, &access)
}

/// Replace the envelope's request line and headers with the carried ones.
///
/// The envelope and the carried request may each have a `host`; the
/// carried one is kept.
fn rewrite_parts(
    mut parts: request::Parts,
    decoded: &Connection,
    carried_host: Option<Bytes>,
) -> Result<request::Parts, ProtocolError> {
    parts.method =
        Method::from_bytes(decoded.method.as_bytes()).map_err(|_| ProtocolError::MissingMethod)?;
    parts.uri = origin_form(decoded).ok_or(ProtocolError::MissingUrl)?;
    parts.headers = header_map(decoded.headers.clone());
    if let Some(host) = carried_host.and_then(|h| HeaderValue::from_maybe_shared(h).ok()) {
        parts.headers.insert(header::HOST, host);
    }
    parts.extensions.insert(RootPath(decoded.root_path.clone()));
    Ok(parts)
}

/// The decoded request target as an origin-form URI.
fn origin_form(decoded: &Connection) -> Option<Uri> {
    let mut target = String::with_capacity(decoded.path.len() + decoded.query_string.len() + 2);
    if !decoded.path.starts_with('/') {
        target.push('/');
    }
    target.push_str(&decoded.path);
    if !decoded.query_string.is_empty() {
        target.push('?');
        target.push_str(std::str::from_utf8(&decoded.query_string).ok()?);
    }
    Uri::try_from(target).ok()
}

/// Encode the application's response head and log the exchange.
fn encode_response(response: Response<Body>, access: &AccessRecord) -> Response<Body> {
    let (mut parts, body) = response.into_parts();

    let mut start = ResponseStart {
        status: parts.status.as_u16(),
        headers: header_list(&parts.headers),
    };
    let status = encode_response_start(&mut start);
    access.log(status);

    parts.status = StatusCode::from_u16(start.status).unwrap_or(StatusCode::OK);
    parts.headers = header_map(start.headers);
    Response::from_parts(parts, body)
}
