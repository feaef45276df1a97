//! Command line and environment overrides.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::FdkConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "fdk-gateway")]
#[command(about = "Serves an HTTP application as an Fn function", long_about = None)]
#[command(version)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "FDK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listener address, `unix:<path>` or `<ip>:<port>`.
    #[arg(long, env = "FN_LISTENER")]
    pub listener: Option<String>,

    /// Mount prefix stripped from request paths.
    #[arg(long, env = "FDK_ROOT_PATH")]
    pub root_path: Option<String>,

    /// Base URL of the wrapped application.
    #[arg(long, env = "FDK_UPSTREAM")]
    pub upstream: Option<String>,

    #[arg(long, env = "FDK_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    #[arg(long, env = "FDK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit one access log line per exchange.
    #[arg(long, env = "FDK_ACCESS_LOG")]
    pub access_log: Option<bool>,
}

impl Cli {
    /// Build the effective configuration: file (or defaults), then
    /// overrides, then validation.
    pub fn into_config(self) -> Result<FdkConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => FdkConfig::default(),
        };
        self.apply(&mut config);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    fn apply(self, config: &mut FdkConfig) {
        if let Some(address) = self.listener {
            config.listener.address = address;
        }
        if let Some(root_path) = self.root_path {
            config.translator.root_path = root_path;
        }
        if let Some(url) = self.upstream {
            config.upstream.url = url;
        }
        if let Some(secs) = self.upstream_timeout_secs {
            config.upstream.timeout_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(enabled) = self.access_log {
            config.observability.access_log = enabled;
        }
    }
}
