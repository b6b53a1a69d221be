//! API Server
//!
//! Hosts the REST router and shuts down gracefully on request.

use crate::error::{Error, Result};
use crate::service::VlanService;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

use super::rest::{RestRouter, DEFAULT_MAX_BODY_SIZE};

// =============================================================================
// Server Configuration
// =============================================================================

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// REST API bind address
    pub bind_addr: SocketAddr,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Max request body size
    pub max_body_size: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            request_timeout_secs: 30,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

/// REST API server for the VLAN service
pub struct ApiServer {
    config: ApiServerConfig,
    service: Arc<VlanService>,
    /// Latched to `true` once shutdown is requested
    shutdown_tx: watch::Sender<bool>,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(config: ApiServerConfig, service: Arc<VlanService>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            config,
            service,
            shutdown_tx,
        }
    }

    pub fn config(&self) -> &ApiServerConfig {
        &self.config
    }

    /// Router with all routes and layers applied
    pub fn router(&self) -> axum::Router {
        RestRouter::new(self.service.clone())
            .max_body_size(self.config.max_body_size)
            .request_timeout(Duration::from_secs(self.config.request_timeout_secs))
            .build()
    }

    /// Bind and serve until [`shutdown`](Self::shutdown) is called
    pub async fn run(&self) -> Result<()> {
        let addr = self.config.bind_addr;
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            Error::Configuration(format!("Failed to bind REST server to {}: {}", addr, e))
        })?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    pub async fn serve(&self, listener: tokio::net::TcpListener) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let app = self.router();

        if let Ok(addr) = listener.local_addr() {
            info!("REST API listening on {}", addr);
        }

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.wait_for(|stop| *stop).await;
                info!("REST server shutting down");
            })
            .await
            .map_err(|e| Error::Internal(format!("REST server error: {}", e)))?;

        Ok(())
    }

    /// Trigger graceful shutdown, also before `serve` has started
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }
}
