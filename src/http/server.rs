//! HTTP server.
//!
//! # Responsibilities
//! - Bind the configured listener (plain or TLS)
//! - Serve the assembled router
//! - Drain in-flight requests on shutdown
//!
//! # Design Decisions
//! - The router is built elsewhere; the server only knows how to host it
//! - Requests accepted on the TLS listener carry a `TlsConnection` marker

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::{Extension, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::schema::ListenerConfig;
use crate::net::tls::{load_tls_config, TlsConnection};

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Hosts an assembled router on the configured listener.
pub struct HttpServer {
    router: Router,
    listener: ListenerConfig,
}

impl HttpServer {
    pub fn new(router: Router, listener: ListenerConfig) -> Self {
        Self { router, listener }
    }

    /// Run until a shutdown signal is received.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.listener.bind_address.parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid bind address {}: {}", self.listener.bind_address, e),
            )
        })?;

        match &self.listener.tls {
            Some(tls) => {
                let tls_config =
                    load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path)).await?;
                let app = self.router.layer(Extension(TlsConnection));

                let handle = axum_server::Handle::new();
                let signal = handle.clone();
                tokio::spawn(async move {
                    let _ = shutdown.recv().await;
                    tracing::info!("Draining TLS listener");
                    signal.graceful_shutdown(Some(DRAIN_TIMEOUT));
                });

                tracing::info!(address = %addr, "HTTPS server starting");
                axum_server::bind_rustls(addr, tls_config)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await?;
            }
            None => {
                let listener = TcpListener::bind(addr).await?;
                tracing::info!(address = %listener.local_addr()?, "HTTP server starting");
                axum::serve(listener, self.router)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                    })
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
