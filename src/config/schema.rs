//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files; every
//! field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct FdkConfig {
    /// Where the Fn server connects to us.
    pub listener: ListenerConfig,

    /// Fn protocol translation settings.
    pub translator: TranslatorConfig,

    /// The wrapped HTTP application.
    pub upstream: UpstreamConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// `unix:<path>` for a unix domain socket (what the Fn server hands
    /// out in `FN_LISTENER`) or `<ip>:<port>` for TCP.
    pub address: String,

    /// Permission bits applied to a unix socket after binding.
    pub socket_mode: u32,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: "unix:./fdk.sock".to_string(),
            socket_mode: 0o666,
        }
    }
}

/// Translation settings shared by every exchange.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Mount prefix stripped from request paths (e.g. `/api`). Empty
    /// disables stripping.
    pub root_path: String,
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the wrapped application, `http://` only.
    pub url: String,

    /// Time allowed for the upstream to produce response headers.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter (trace, debug, info, warn, error, or full directives).
    pub log_level: String,

    /// Emit one access log line per translated exchange.
    pub access_log: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            access_log: true,
        }
    }
}
