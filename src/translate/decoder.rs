//! Request decoding: encapsulated Fn call → conventional connection.
//!
//! # Responsibilities
//! - Reject anything that is not `POST /call`
//! - Recover the real method, URL and headers from the `fn-http-*` headers
//! - Strip the configured mount prefix and record it as `root_path`
//!
//! # Design Decisions
//! - Checks run in a fixed order: path, method, URL, then method header
//! - The input connection is borrowed, so a failed decode leaves it intact
//! - The configured mount prefix is the single source of truth for
//!   `root_path`; whatever the transport put there is overwritten

use bytes::Bytes;

use crate::protocol::headers::{classify, Classified};
use crate::protocol::{url, Connection, ConnectionKind, ProtocolError, CALL_METHOD, CALL_PATH};

/// Decodes encapsulated Fn calls. Cheap to clone, immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RequestDecoder {
    root_path: String,
}

impl RequestDecoder {
    /// Create a decoder that strips `root_path` from incoming paths.
    /// An empty `root_path` disables stripping.
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
        }
    }

    /// Decode an encapsulated call into the request the application sees.
    pub fn decode(&self, connection: &Connection) -> Result<Connection, ProtocolError> {
        if connection.path != CALL_PATH {
            return Err(ProtocolError::PathNotFound);
        }
        if connection.method != CALL_METHOD {
            return Err(ProtocolError::MethodNotAllowed);
        }

        let Classified {
            headers,
            url,
            method,
        } = classify(&connection.headers);

        let url = url.ok_or(ProtocolError::MissingUrl)?;
        let parts = url::decompose(&url).map_err(|e| {
            tracing::debug!(error = %e, "Carried request URL rejected");
            ProtocolError::MissingUrl
        })?;

        let method = method
            .filter(|m| !m.is_empty())
            .and_then(|m| String::from_utf8(m.to_vec()).ok())
            .ok_or(ProtocolError::MissingMethod)?;

        let (path, root_path) = self.strip_root_path(&parts.path);

        if !connection.root_path.is_empty() && connection.root_path != root_path {
            tracing::debug!(
                inbound = %connection.root_path,
                configured = %root_path,
                "Overriding inbound root path"
            );
        }

        Ok(Connection {
            kind: ConnectionKind::Http,
            http_version: connection.http_version.clone(),
            scheme: parts.scheme.unwrap_or_else(|| connection.scheme.clone()),
            method,
            raw_path: Bytes::from(parts.path.clone()),
            path,
            query_string: parts.query,
            root_path,
            headers,
            client: connection.client,
        })
    }

    /// Strip the mount prefix once, if present. Returns the new path and
    /// the root path to record.
    fn strip_root_path(&self, path: &str) -> (String, String) {
        if self.root_path.is_empty() {
            return (path.to_string(), String::new());
        }

        match path.strip_prefix(self.root_path.as_str()) {
            Some(rest) => (rest.to_string(), self.root_path.clone()),
            None => (path.to_string(), String::new()),
        }
    }
}
