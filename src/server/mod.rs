//! Telemetry server
//!
//! Owns the router, the connection registry, and the ingestion pipeline, and
//! drives them over one TCP listener. The HTTP layer is deliberately thin:
//! handlers validate nothing themselves and delegate straight to the
//! pipeline and the store.

pub mod config;
mod http;
mod ws;

pub use config::ServerConfig;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::ingest::IngestionPipeline;
use crate::registry::{ConnectionRegistry, RegistryConfig};
use crate::store::ReadingStore;

/// Sensor telemetry server
pub struct SensorServer<S> {
    config: ServerConfig,
    registry: Arc<ConnectionRegistry>,
    pipeline: Arc<IngestionPipeline<S>>,
    store: Arc<S>,
}

impl<S: ReadingStore + 'static> SensorServer<S> {
    /// Create a new server with the given configuration and store
    pub fn new(config: ServerConfig, store: S) -> Self {
        Self::with_registry_config(config, store, RegistryConfig::default())
    }

    /// Create a new server with custom registry configuration
    pub fn with_registry_config(
        config: ServerConfig,
        store: S,
        registry_config: RegistryConfig,
    ) -> Self {
        let store = Arc::new(store);
        let registry = Arc::new(ConnectionRegistry::with_config(registry_config));
        let pipeline = Arc::new(IngestionPipeline::new(
            Arc::clone(&store),
            Arc::clone(&registry),
        ));

        Self {
            config,
            registry,
            pipeline,
            store,
        }
    }

    /// Get a reference to the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    fn router(&self) -> Router {
        http::router(http::AppState {
            pipeline: Arc::clone(&self.pipeline),
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        })
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Telemetry server listening");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Run the server with graceful shutdown
    ///
    /// When `shutdown` resolves, the listener stops accepting and the
    /// registry is drained: every open viewer connection gets the close
    /// handshake, with in-flight sends allowed to finish or time out.
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Telemetry server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        self.registry.close_all().await;

        let stats = self.registry.stats().snapshot();
        tracing::info!(
            total_connections = stats.total_connections,
            broadcasts = stats.broadcasts,
            payloads_enqueued = stats.payloads_enqueued,
            connections_dropped = stats.connections_dropped,
            "Server stopped"
        );

        Ok(())
    }
}
