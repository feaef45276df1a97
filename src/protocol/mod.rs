//! Fn HTTP encapsulation protocol.
//!
//! # Data Flow
//! ```text
//! Fn server "call" (POST /call, fn-http-* headers)
//!     → headers.rs (classify: application headers, carried URL, carried method)
//!     → url.rs (decompose carried URL into scheme, path, query)
//!     → translate::decoder (conventional Connection)
//!
//! Application response
//!     → translate::encoder (prefix headers, carry true status, clamp status)
//!     → Fn server
//! ```
//!
//! # Design Decisions
//! - Header keys and values are raw bytes; only the synthetic prefix is
//!   ever rewritten, so case and duplicates survive untouched
//! - The wire constants live here and nowhere else

pub mod error;
pub mod headers;
pub mod types;
pub mod url;

pub use error::ProtocolError;
pub use headers::HeaderList;
pub use types::{Connection, ConnectionKind, Event, RequestBody, ResponseBody, ResponseStart};

/// Prefix carried by every application header on the wire.
pub const FN_HTTP_H_: &[u8] = b"fn-http-h-";

/// Header carrying the real request URL.
pub const FN_HTTP_REQUEST_URL: &[u8] = b"fn-http-request-url";

/// Header carrying the real request method.
pub const FN_HTTP_METHOD: &[u8] = b"fn-http-method";

/// Header carrying the application's true response status.
pub const FN_HTTP_STATUS: &[u8] = b"fn-http-status";

/// Header identifying this translator to the Fn server.
pub const FN_FDK_VERSION: &[u8] = b"fn-fdk-version";

/// The one header that travels unprefixed in both directions.
pub const CONTENT_TYPE: &[u8] = b"content-type";

/// Every encapsulated request must use this path...
pub const CALL_PATH: &str = "/call";

/// ...and this method.
pub const CALL_METHOD: &str = "POST";

/// Statuses the Fn server passes through to its clients.
pub const ALLOWED_STATUSES: [u16; 3] = [200, 502, 504];

/// Status used for any application status outside [`ALLOWED_STATUSES`].
pub const DEFAULT_STATUS: u16 = 200;

/// Value of the [`FN_FDK_VERSION`] header.
pub const FDK_VERSION: &str = concat!("fdk-asgi/", env!("CARGO_PKG_VERSION"));

/// Returns true if the Fn server lets `status` through unchanged.
pub fn is_allowed_status(status: u16) -> bool {
    ALLOWED_STATUSES.contains(&status)
}
