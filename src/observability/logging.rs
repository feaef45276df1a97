//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Apply the configured level, with `RUST_LOG` taking precedence
//! - Silence the access log when it is disabled

use tracing_subscriber::filter::Directive;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::observability::ACCESS_LOG_TARGET;

/// Build the event filter for `config`.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.access_log {
        return filter;
    }
    match format!("{ACCESS_LOG_TARGET}=off").parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(config))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
}
