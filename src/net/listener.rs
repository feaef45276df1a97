//! Listener binding for the address the Fn server hands out.
//!
//! # Responsibilities
//! - Parse `unix:<path>` and `<ip>:<port>` listener addresses
//! - Replace a stale unix socket file before binding
//! - Open up socket permissions so the Fn server can connect

use std::fmt;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid listener address {0:?}")]
    Parse(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Where to listen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddress {
    Unix(PathBuf),
    Tcp(SocketAddr),
}

impl FromStr for ListenAddress {
    type Err = ListenerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(path) = s.strip_prefix("unix:") {
            if path.is_empty() {
                return Err(ListenerError::Parse(s.to_string()));
            }
            return Ok(ListenAddress::Unix(PathBuf::from(path)));
        }
        s.parse()
            .map(ListenAddress::Tcp)
            .map_err(|_| ListenerError::Parse(s.to_string()))
    }
}

impl fmt::Display for ListenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenAddress::Unix(path) => write!(f, "unix:{}", path.display()),
            ListenAddress::Tcp(addr) => write!(f, "{addr}"),
        }
    }
}

impl ListenAddress {
    /// Bind a listener at this address.
    pub async fn bind(&self, config: &ListenerConfig) -> Result<BoundListener, ListenerError> {
        let bind_error = |source| ListenerError::Bind {
            address: self.to_string(),
            source,
        };

        match self {
            ListenAddress::Tcp(addr) => {
                let listener = TcpListener::bind(addr).await.map_err(bind_error)?;
                let local_addr = listener.local_addr().map_err(bind_error)?;
                tracing::info!(address = %local_addr, "Listener bound");
                Ok(BoundListener::Tcp(listener))
            }
            #[cfg(unix)]
            ListenAddress::Unix(path) => {
                let listener = bind_unix(path, config.socket_mode).map_err(bind_error)?;
                tracing::info!(
                    path = %path.display(),
                    mode = %format!("{:o}", config.socket_mode),
                    "Listener bound"
                );
                Ok(BoundListener::Unix {
                    listener,
                    path: path.clone(),
                })
            }
            #[cfg(not(unix))]
            ListenAddress::Unix(_) => {
                let _ = config;
                Err(bind_error(std::io::Error::new(
                    std::io::ErrorKind::Unsupported,
                    "unix sockets are not supported on this platform",
                )))
            }
        }
    }
}

#[cfg(unix)]
fn bind_unix(path: &Path, mode: u32) -> std::io::Result<UnixListener> {
    use std::os::unix::fs::PermissionsExt;

    remove_socket(path)?;
    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(listener)
}

/// Remove a socket file, ignoring one that does not exist.
pub fn remove_socket(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "Removed stale socket");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// A bound listener, ready to be served.
#[derive(Debug)]
pub enum BoundListener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix { listener: UnixListener, path: PathBuf },
}

impl BoundListener {
    /// Local TCP address, if this is a TCP listener.
    pub fn tcp_addr(&self) -> Option<SocketAddr> {
        match self {
            BoundListener::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            BoundListener::Unix { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_addresses() {
        assert_eq!(
            "unix:/tmp/fdk.sock".parse::<ListenAddress>().unwrap(),
            ListenAddress::Unix(PathBuf::from("/tmp/fdk.sock"))
        );
        assert_eq!(
            "127.0.0.1:8080".parse::<ListenAddress>().unwrap(),
            ListenAddress::Tcp("127.0.0.1:8080".parse().unwrap())
        );
        assert!("unix:".parse::<ListenAddress>().is_err());
        assert!("localhost".parse::<ListenAddress>().is_err());
    }

    #[test]
    fn test_display_round() {
        let address: ListenAddress = "unix:./fdk.sock".parse().unwrap();
        assert_eq!(address.to_string(), "unix:./fdk.sock");
    }

    #[tokio::test]
    async fn test_bind_tcp() {
        let address: ListenAddress = "127.0.0.1:0".parse().unwrap();
        let listener = address.bind(&ListenerConfig::default()).await.unwrap();
        assert!(listener.tcp_addr().unwrap().port() > 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_bind_unix_replaces_stale_socket() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fdk.sock");
        std::fs::write(&path, b"stale").unwrap();

        let address = ListenAddress::Unix(path.clone());
        let listener = address.bind(&ListenerConfig::default()).await.unwrap();

        assert!(listener.tcp_addr().is_none());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }
}
