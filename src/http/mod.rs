//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Fn server connection (unix socket or TCP)
//!     → server.rs (Axum setup, TraceLayer)
//!     → translate.rs (decode POST /call, encode response head)
//!     → forward.rs (proxy to the upstream application)
//!     → Send back to the Fn server
//! ```

pub mod convert;
pub mod forward;
pub mod server;
pub mod translate;

pub use forward::Upstream;
pub use server::GatewayServer;
pub use translate::{translated, RootPath};
