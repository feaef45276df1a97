//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! translate/encoder.rs  → access log line per exchange (ACCESS_LOG_TARGET)
//! translate/responder.rs → error event per rejected call
//! http (TraceLayer)      → request spans
//!     → logging.rs (EnvFilter + fmt subscriber) → stdout
//! ```
//!
//! # Design Decisions
//! - Everything goes through `tracing`; the access log is an ordinary
//!   event under its own target so it can be filtered independently

pub mod logging;

/// Target of the per-exchange access log events.
pub const ACCESS_LOG_TARGET: &str = "fdk_gateway::access";
