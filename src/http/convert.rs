//! Conversions between `http` types and the protocol types.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{request, HeaderMap, HeaderName, HeaderValue, Version};
use bytes::Bytes;

use crate::protocol::{Connection, ConnectionKind, HeaderList};

/// HTTP version as written after `HTTP/`.
pub fn http_version(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Describe an inbound request as a [`Connection`].
pub fn connection_from_parts(parts: &request::Parts) -> Connection {
    let path = parts.uri.path();

    Connection {
        kind: ConnectionKind::Http,
        http_version: http_version(parts.version).to_string(),
        scheme: parts.uri.scheme_str().unwrap_or("http").to_string(),
        method: parts.method.as_str().to_string(),
        path: path.to_string(),
        raw_path: Bytes::copy_from_slice(path.as_bytes()),
        query_string: parts
            .uri
            .query()
            .map(|q| Bytes::copy_from_slice(q.as_bytes()))
            .unwrap_or_default(),
        root_path: String::new(),
        headers: header_list(&parts.headers),
        client: parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0),
    }
}

/// Copy a header map into an ordered header list.
pub fn header_list(headers: &HeaderMap) -> HeaderList {
    headers
        .iter()
        .map(|(name, value)| (name.as_str().as_bytes(), value.as_bytes()))
        .collect()
}

/// Build a header map from a header list, keeping repeated keys.
///
/// Pairs that are not valid HTTP headers are dropped with a warning.
pub fn header_map(headers: HeaderList) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (key, value) in headers {
        let name = match HeaderName::from_bytes(&key) {
            Ok(name) => name,
            Err(_) => {
                tracing::warn!(
                    header = %String::from_utf8_lossy(&key),
                    "Dropping invalid header name"
                );
                continue;
            }
        };
        let value = match HeaderValue::from_maybe_shared(value) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(header = %name, "Dropping invalid header value");
                continue;
            }
        };
        map.append(name, value);
    }
    map
}
