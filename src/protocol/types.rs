//! Connection descriptor and the events exchanged with an application.

use std::net::SocketAddr;

use bytes::Bytes;

use super::headers::HeaderList;

/// Kind of connection handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionKind {
    /// A plain HTTP request/response exchange. The only kind translated.
    Http,
    /// Anything else (`lifespan`, `websocket`, ...). Passed through as is.
    Other(String),
}

/// One request/response exchange as seen by the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub kind: ConnectionKind,

    /// HTTP version without the `HTTP/` prefix, e.g. `1.1`.
    pub http_version: String,

    pub scheme: String,

    pub method: String,

    /// Decoded request path.
    pub path: String,

    /// Path as received, excluding the query string.
    pub raw_path: Bytes,

    /// Query string without the leading `?`, possibly empty.
    pub query_string: Bytes,

    /// Mount prefix the application is served under, possibly empty.
    pub root_path: String,

    pub headers: HeaderList,

    /// Peer address, if the transport knows it.
    pub client: Option<SocketAddr>,
}

impl Connection {
    /// Create an HTTP connection for `method` and a target such as
    /// `/users?limit=10`.
    pub fn http(method: impl Into<String>, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };

        Self {
            kind: ConnectionKind::Http,
            http_version: "1.1".to_string(),
            scheme: "http".to_string(),
            method: method.into(),
            path: path.to_string(),
            raw_path: Bytes::copy_from_slice(path.as_bytes()),
            query_string: Bytes::copy_from_slice(query.as_bytes()),
            root_path: String::new(),
            headers: HeaderList::new(),
            client: None,
        }
    }

    /// Create a connection of a kind this crate does not translate.
    pub fn other(kind: impl Into<String>) -> Self {
        Self {
            kind: ConnectionKind::Other(kind.into()),
            ..Self::http("GET", "/")
        }
    }

    /// Append a header, keeping insertion order.
    pub fn with_header(mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) -> Self {
        self.headers.push(key, value);
        self
    }

    pub fn is_http(&self) -> bool {
        self.kind == ConnectionKind::Http
    }

    /// Path followed by `?query` when the query is not empty.
    pub fn path_with_query(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, String::from_utf8_lossy(&self.query_string))
        }
    }
}

/// A chunk of the inbound request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestBody {
    pub body: Bytes,
    pub more_body: bool,
}

/// Start of a response: status line and headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseStart {
    pub status: u16,
    pub headers: HeaderList,
}

/// A chunk of the response body. `more_body` is false on the last chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResponseBody {
    pub body: Bytes,
    pub more_body: bool,
}

/// Outbound event emitted by an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(ResponseStart),
    Body(ResponseBody),
    /// Trailing headers after the last body chunk.
    Trailers(HeaderList),
}

impl Event {
    /// Convenience constructor for a start event.
    pub fn start(status: u16, headers: HeaderList) -> Self {
        Event::Start(ResponseStart { status, headers })
    }

    /// Convenience constructor for a body event.
    pub fn body(body: impl Into<Bytes>, more_body: bool) -> Self {
        Event::Body(ResponseBody {
            body: body.into(),
            more_body,
        })
    }
}
