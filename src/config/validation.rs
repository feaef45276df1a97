//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate the listener address, mount prefix and upstream URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: FdkConfig → Result<(), Vec<ValidationError>>
//! - Runs after CLI overrides are applied, before anything is bound

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::schema::FdkConfig;
use crate::net::ListenAddress;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener address {0:?} is neither unix:<path> nor <ip>:<port>")]
    ListenerAddress(String),

    #[error("root path {0:?} must start with '/' and must not end with '/'")]
    RootPath(String),

    #[error("upstream url {url:?} is invalid: {reason}")]
    UpstreamUrl { url: String, reason: String },

    #[error("upstream timeout must be greater than zero")]
    UpstreamTimeout,

    #[error("log level {0:?} is not a valid filter")]
    LogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &FdkConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.parse::<ListenAddress>().is_err() {
        errors.push(ValidationError::ListenerAddress(
            config.listener.address.clone(),
        ));
    }

    let root_path = &config.translator.root_path;
    if !root_path.is_empty() && (!root_path.starts_with('/') || root_path.ends_with('/')) {
        errors.push(ValidationError::RootPath(root_path.clone()));
    }

    if let Err(reason) = check_upstream_url(&config.upstream.url) {
        errors.push(ValidationError::UpstreamUrl {
            url: config.upstream.url.clone(),
            reason,
        });
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::UpstreamTimeout);
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_upstream_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;

    if url.scheme() != "http" {
        return Err(format!("scheme {:?} is not supported", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&FdkConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = FdkConfig::default();
        config.listener.address = "nowhere".into();
        config.translator.root_path = "api/".into();
        config.upstream.url = "https://app".into();
        config.upstream.timeout_secs = 0;

        let errors = validate_config(&config).unwrap_err();

        assert_eq!(errors.len(), 4);
        assert_eq!(errors[0], ValidationError::ListenerAddress("nowhere".into()));
        assert_eq!(errors[1], ValidationError::RootPath("api/".into()));
        assert!(matches!(errors[2], ValidationError::UpstreamUrl { .. }));
        assert_eq!(errors[3], ValidationError::UpstreamTimeout);
    }

    #[test]
    fn test_root_path_rules() {
        let mut config = FdkConfig::default();

        for ok in ["", "/api", "/a/b"] {
            config.translator.root_path = ok.into();
            assert!(validate_config(&config).is_ok(), "{ok:?} should be valid");
        }
        for bad in ["api", "/api/", "/"] {
            config.translator.root_path = bad.into();
            assert!(validate_config(&config).is_err(), "{bad:?} should be invalid");
        }
    }

    #[test]
    fn test_upstream_url_rules() {
        assert!(check_upstream_url("http://127.0.0.1:8080").is_ok());
        assert!(check_upstream_url("http://app/base").is_ok());
        assert!(check_upstream_url("not a url").is_err());
        assert!(check_upstream_url("http://app/?q=1").is_err());
        assert!(check_upstream_url("unix:/tmp/app.sock").is_err());
    }
}
