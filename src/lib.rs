//! Fn function gateway library.
//!
//! Translates the Fn server's encapsulated `POST /call` exchanges into
//! ordinary HTTP requests for a wrapped application, and the
//! application's responses back into the form the Fn server accepts.

// Wire format and translation core
pub mod protocol;
pub mod translate;

// Transport
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

// Inverse transform and in-memory doubles
pub mod testing;

pub use config::FdkConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
pub use translate::{EventSink, EventSource, Handler, Translator};

/// Crate version, as reported in `fn-fdk-version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
