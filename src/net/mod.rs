//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! FN_LISTENER / config address
//!     → listener.rs (parse, bind, socket permissions)
//!     → Hand off to HTTP layer
//! ```

pub mod listener;

pub use listener::{remove_socket, BoundListener, ListenAddress, ListenerError};
