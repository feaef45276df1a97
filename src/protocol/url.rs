//! Decomposition of the carried request URL.
//!
//! The Fn server sends either an absolute URL (`https://host/path?query`)
//! or just the request target (`/path?query`). Both are accepted; the path
//! is kept exactly as received (no normalization, no percent-decoding).

use axum::http::Uri;
use bytes::Bytes;

/// Scheme, path and query of a carried URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlParts {
    /// `None` for origin-form targets.
    pub scheme: Option<String>,
    pub path: String,
    /// Query without the leading `?`, empty if absent.
    pub query: Bytes,
}

/// Error returned for a carried URL that cannot be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid request URL: {0}")]
pub struct InvalidUrl(String);

/// Decompose a carried URL into its parts.
pub fn decompose(raw: &[u8]) -> Result<UrlParts, InvalidUrl> {
    if raw.is_empty() {
        return Err(InvalidUrl("empty".to_string()));
    }

    let uri = Uri::try_from(raw).map_err(|e| InvalidUrl(e.to_string()))?;

    // Authority-form ("host:port") has no path at all.
    let path = uri.path();
    if path.is_empty() {
        return Err(InvalidUrl(format!(
            "no path in {}",
            String::from_utf8_lossy(raw)
        )));
    }

    Ok(UrlParts {
        scheme: uri.scheme_str().map(str::to_string),
        path: path.to_string(),
        query: uri
            .query()
            .map(|q| Bytes::copy_from_slice(q.as_bytes()))
            .unwrap_or_default(),
    })
}
