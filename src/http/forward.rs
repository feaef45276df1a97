//! Forwarding decoded requests to the wrapped application.
//!
//! # Responsibilities
//! - Re-target the request at the upstream base URL
//! - Drop hop-by-hop and framing headers in both directions
//! - Map connection failures to 502 and timeouts to 504

use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::UpstreamConfig;
use crate::http::translate::RootPath;

const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
const X_FORWARDED_PREFIX: HeaderName = HeaderName::from_static("x-forwarded-prefix");

static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Client for the wrapped application.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    base: String,
    timeout: Duration,
}

impl Upstream {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            client,
            base: config.url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Base URL requests are forwarded under, without a trailing `/`.
    pub fn base(&self) -> &str {
        &self.base
    }

    fn target(&self, uri: &Uri) -> Result<Uri, axum::http::uri::InvalidUri> {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        format!("{}{}", self.base, path_and_query).parse()
    }
}

/// Fallback handler forwarding every request to the upstream.
pub async fn forward(State(upstream): State<Upstream>, request: Request<Body>) -> Response {
    let (mut parts, body) = request.into_parts();

    parts.uri = match upstream.target(&parts.uri) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(error = %e, "Cannot build upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
        }
    };
    parts.version = Version::HTTP_11;

    let root_path = parts.extensions.get::<RootPath>().cloned().unwrap_or_default();
    prepare_request_headers(&mut parts.headers, &root_path);

    tracing::debug!(method = %parts.method, uri = %parts.uri, "Forwarding to upstream");

    let pending = upstream.client.request(Request::from_parts(parts, body));
    match tokio::time::timeout(upstream.timeout, pending).await {
        Ok(Ok(response)) => {
            let response: Response<hyper::body::Incoming> = response;
            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, upstream = %upstream.base, "Upstream request failed");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
        Err(_) => {
            tracing::warn!(
                timeout = ?upstream.timeout,
                upstream = %upstream.base,
                "Upstream timed out"
            );
            (StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out").into_response()
        }
    }
}

/// Remove hop-by-hop headers, including any named in `connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in named.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Headers for the upstream request.
///
/// `host` and framing headers are recomputed by the client. The
/// application's `host` is passed on as `x-forwarded-host`.
fn prepare_request_headers(headers: &mut HeaderMap, root_path: &RootPath) {
    strip_hop_by_hop(headers);
    headers.remove(header::CONTENT_LENGTH);

    if let Some(host) = headers.get_all(header::HOST).iter().last().cloned() {
        headers.insert(X_FORWARDED_HOST, host);
    }
    headers.remove(header::HOST);

    if !root_path.0.is_empty() {
        if let Ok(prefix) = HeaderValue::from_str(&root_path.0) {
            headers.insert(X_FORWARDED_PREFIX, prefix);
        }
    }
}
