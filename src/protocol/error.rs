//! Protocol errors for malformed encapsulated requests.

use axum::http::StatusCode;
use thiserror::Error;

/// A call the Fn server should never have sent. Always terminal for the
/// exchange; the wrapped application is never invoked.
///
/// The `Display` output is the response body sent back to the Fn server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Encapsulated request path is not `/call`.
    #[error("Path not found!")]
    PathNotFound,

    /// Encapsulated request method is not `POST`.
    #[error("Method not allowed!")]
    MethodNotAllowed,

    /// No usable `fn-http-request-url` header.
    #[error("Could not determine request URL!")]
    MissingUrl,

    /// No usable `fn-http-method` header.
    #[error("Could not determine request method!")]
    MissingMethod,
}

impl ProtocolError {
    /// Status code sent with the error response.
    pub fn status(&self) -> StatusCode {
        match self {
            ProtocolError::PathNotFound => StatusCode::NOT_FOUND,
            ProtocolError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProtocolError::MissingUrl | ProtocolError::MissingMethod => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status() {
        assert_eq!(ProtocolError::PathNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ProtocolError::MethodNotAllowed.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(ProtocolError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ProtocolError::MissingMethod.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ProtocolError::PathNotFound.to_string(), "Path not found!");
        assert_eq!(
            ProtocolError::MissingUrl.to_string(),
            "Could not determine request URL!"
        );
    }
}
