//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum Router: upstream forwarding behind Fn translation
//! - Wire up middleware (tracing)
//! - Serve on a TCP or unix socket listener until shutdown

use std::net::SocketAddr;

use axum::Router;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::FdkConfig;
use crate::http::forward::{forward, Upstream};
use crate::http::translate::translated;
use crate::net::BoundListener;

/// The Fn gateway: translates calls and forwards them to the upstream.
pub struct GatewayServer {
    router: Router,
    config: FdkConfig,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: FdkConfig) -> Self {
        let upstream = Upstream::new(&config.upstream);
        let router = Self::build_router(&config, upstream);
        Self { router, config }
    }

    fn build_router(config: &FdkConfig, upstream: Upstream) -> Router {
        let app = Router::new().fallback(forward).with_state(upstream);

        translated(app, &config.translator).layer(TraceLayer::new_for_http())
    }

    /// The complete service, for driving without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then drain in-flight exchanges.
    ///
    /// A unix socket file is removed once serving stops.
    pub async fn run(
        self,
        listener: BoundListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let signal = async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received");
        };

        match listener {
            BoundListener::Tcp(listener) => {
                tracing::info!(
                    address = %listener.local_addr()?,
                    upstream = %self.config.upstream.url,
                    "Fn gateway starting"
                );
                let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
                axum::serve(listener, app)
                    .with_graceful_shutdown(signal)
                    .await?;
            }
            #[cfg(unix)]
            BoundListener::Unix { listener, path } => {
                tracing::info!(
                    path = %path.display(),
                    upstream = %self.config.upstream.url,
                    "Fn gateway starting"
                );
                let served = axum::serve(listener, self.router)
                    .with_graceful_shutdown(signal)
                    .await;
                crate::net::remove_socket(&path)?;
                served?;
            }
        }

        tracing::info!("Fn gateway stopped");
        Ok(())
    }
}
