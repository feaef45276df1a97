//! The inverse transform for axum applications.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, Response, StatusCode, Uri},
    middleware::{self, Next},
    Router,
};

use super::inverse::{ContractViolation, InverseTransform};
use crate::http::convert::{connection_from_parts, header_list, header_map};
use crate::protocol::{ResponseStart, CALL_PATH};

/// Drive `app`, which expects Fn calls, with conventional requests.
///
/// A response that breaks the Fn contract becomes a 500 carrying the
/// [`ContractViolation`] as a response extension.
pub fn inverted(app: Router, transform: InverseTransform) -> Router {
    Router::new()
        .fallback_service(app)
        .layer(middleware::from_fn_with_state(Arc::new(transform), inverse))
}

async fn inverse(
    State(transform): State<Arc<InverseTransform>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let response = next.run(encapsulate_request(&transform, request)).await;

    match decapsulate_response(&transform, response) {
        Ok(response) => response,
        Err(violation) => {
            tracing::error!(error = %violation, "Fn contract violated");
            let mut response = Response::new(Body::from(violation.to_string()));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response.extensions_mut().insert(violation);
            response
        }
    }
}

/// Turn a conventional request into the Fn call for it.
pub fn encapsulate_request(transform: &InverseTransform, request: Request<Body>) -> Request<Body> {
    let (mut parts, body) = request.into_parts();
    let call = transform.encapsulate(connection_from_parts(&parts));

    parts.method = Method::POST;
    parts.uri = Uri::from_static(CALL_PATH);
    parts.headers = header_map(call.headers);
    Request::from_parts(parts, body)
}

/// Check an encoded response and restore the application's response.
pub fn decapsulate_response(
    transform: &InverseTransform,
    response: Response<Body>,
) -> Result<Response<Body>, ContractViolation> {
    let (mut parts, body) = response.into_parts();

    let start = transform.decapsulate(ResponseStart {
        status: parts.status.as_u16(),
        headers: header_list(&parts.headers),
    })?;

    parts.status = StatusCode::from_u16(start.status)
        .map_err(|_| ContractViolation::StatusHeaderUnparseable(start.status.to_string()))?;
    parts.headers = header_map(start.headers);
    Ok(Response::from_parts(parts, body))
}
