//! Header lists and the inbound header classifier.
//!
//! # Responsibilities
//! - Ordered, duplicate-preserving header storage
//! - Case-insensitive matching of the `fn-http-*` keys
//! - Splitting an encapsulated header set into application headers,
//!   carried URL and carried method
//!
//! # Design Decisions
//! - Keys are matched case-insensitively but never rewritten; stripping the
//!   prefix slices the original bytes so the remainder keeps its case
//! - A repeated carried URL or method header overrides earlier ones

use bytes::Bytes;

use super::{CONTENT_TYPE, FN_HTTP_H_, FN_HTTP_METHOD, FN_HTTP_REQUEST_URL};

/// Ordered list of raw `(key, value)` header pairs. Duplicates allowed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderList(Vec<(Bytes, Bytes)>);

impl HeaderList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Append a header at the end of the list.
    pub fn push(&mut self, key: impl AsRef<[u8]>, value: impl AsRef<[u8]>) {
        self.0.push((
            Bytes::copy_from_slice(key.as_ref()),
            Bytes::copy_from_slice(value.as_ref()),
        ));
    }

    /// Append a header without copying.
    pub fn push_bytes(&mut self, key: Bytes, value: Bytes) {
        self.0.push((key, value));
    }

    /// First value whose key matches `key`, ignoring ASCII case.
    pub fn get(&self, key: &[u8]) -> Option<&Bytes> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Remove every header matching `key` (ignoring case) and return the
    /// first removed value.
    pub fn remove(&mut self, key: &[u8]) -> Option<Bytes> {
        let mut removed = None;
        self.0.retain(|(k, v)| {
            if k.eq_ignore_ascii_case(key) {
                removed.get_or_insert_with(|| v.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Bytes, Bytes)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<(Bytes, Bytes)>> for HeaderList {
    fn from(headers: Vec<(Bytes, Bytes)>) -> Self {
        Self(headers)
    }
}

impl<K: AsRef<[u8]>, V: AsRef<[u8]>> FromIterator<(K, V)> for HeaderList {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = HeaderList::new();
        for (key, value) in iter {
            headers.push(key, value);
        }
        headers
    }
}

impl IntoIterator for HeaderList {
    type Item = (Bytes, Bytes);
    type IntoIter = std::vec::IntoIter<(Bytes, Bytes)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Returns true if `key` starts with `prefix`, ignoring ASCII case.
pub fn starts_with_ignore_case(key: &[u8], prefix: &[u8]) -> bool {
    key.len() >= prefix.len() && key[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// The exempt header, which is never prefixed.
pub fn is_content_type(key: &[u8]) -> bool {
    key.eq_ignore_ascii_case(CONTENT_TYPE)
}

/// `fn-http-h-` followed by the original key bytes.
pub fn prefix_key(key: &[u8]) -> Bytes {
    let mut prefixed = Vec::with_capacity(FN_HTTP_H_.len() + key.len());
    prefixed.extend_from_slice(FN_HTTP_H_);
    prefixed.extend_from_slice(key);
    Bytes::from(prefixed)
}

/// The key without its `fn-http-h-` prefix, if it has one.
pub fn strip_prefix(key: &Bytes) -> Option<Bytes> {
    starts_with_ignore_case(key, FN_HTTP_H_).then(|| key.slice(FN_HTTP_H_.len()..))
}

/// An encapsulated header set split into its parts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classified {
    /// Application headers in their original relative order.
    pub headers: HeaderList,
    pub url: Option<Bytes>,
    pub method: Option<Bytes>,
}

/// Split encapsulated headers into application headers, URL and method.
pub fn classify(headers: &HeaderList) -> Classified {
    let mut classified = Classified {
        headers: HeaderList::with_capacity(headers.len()),
        ..Default::default()
    };

    for (key, value) in headers.iter() {
        if let Some(stripped) = strip_prefix(key) {
            classified.headers.push_bytes(stripped, value.clone());
        } else if key.eq_ignore_ascii_case(FN_HTTP_REQUEST_URL) {
            classified.url = Some(value.clone());
        } else if key.eq_ignore_ascii_case(FN_HTTP_METHOD) {
            classified.method = Some(value.clone());
        } else {
            classified.headers.push_bytes(key.clone(), value.clone());
        }
    }

    classified
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_splits_headers() {
        let headers: HeaderList = [
            ("host", "localhost"),
            ("Fn-Http-H-Accept", "*/*"),
            ("fn-http-request-url", "https://foo.bar/users"),
            ("content-type", "application/json"),
            ("FN-HTTP-METHOD", "GET"),
            ("fn-http-h-x-real-ip", "10.0.0.1"),
        ]
        .into_iter()
        .collect();

        let classified = classify(&headers);

        assert_eq!(classified.url, Some(Bytes::from_static(b"https://foo.bar/users")));
        assert_eq!(classified.method, Some(Bytes::from_static(b"GET")));

        let expected: HeaderList = [
            ("host", "localhost"),
            ("Accept", "*/*"),
            ("content-type", "application/json"),
            ("x-real-ip", "10.0.0.1"),
        ]
        .into_iter()
        .collect();
        assert_eq!(classified.headers, expected);
    }

    #[test]
    fn test_classify_without_carried_values() {
        let headers: HeaderList = [("fn-call-id", "01HEJ")].into_iter().collect();
        let classified = classify(&headers);

        assert!(classified.url.is_none());
        assert!(classified.method.is_none());
        assert_eq!(classified.headers.len(), 1);
    }

    #[test]
    fn test_last_carried_url_wins() {
        let headers: HeaderList = [
            ("fn-http-request-url", "/first"),
            ("fn-http-request-url", "/second"),
        ]
        .into_iter()
        .collect();

        assert_eq!(classify(&headers).url, Some(Bytes::from_static(b"/second")));
    }

    #[test]
    fn test_prefix_and_strip() {
        let prefixed = prefix_key(b"X-Custom");
        assert_eq!(prefixed, Bytes::from_static(b"fn-http-h-X-Custom"));
        assert_eq!(strip_prefix(&prefixed), Some(Bytes::from_static(b"X-Custom")));
        assert_eq!(strip_prefix(&Bytes::from_static(b"x-custom")), None);
    }

    #[test]
    fn test_header_list_lookup_ignores_case() {
        let mut headers: HeaderList = [("Content-Type", "text/plain"), ("a", "1"), ("A", "2")]
            .into_iter()
            .collect();

        assert!(is_content_type(b"CONTENT-TYPE"));
        assert_eq!(headers.get(b"content-type"), Some(&Bytes::from_static(b"text/plain")));
        assert_eq!(headers.remove(b"a"), Some(Bytes::from_static(b"1")));
        assert_eq!(headers.len(), 1);
    }
}
