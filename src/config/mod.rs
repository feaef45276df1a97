//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (command line and environment overrides)
//!     → validation.rs (semantic checks)
//!     → FdkConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so the gateway runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{read_config, ConfigError};
pub use schema::{FdkConfig, ListenerConfig, ObservabilityConfig, TranslatorConfig, UpstreamConfig};
pub use validation::{validate_config, ValidationError};
