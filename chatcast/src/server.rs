//! Server lifecycle: HTTP gateway startup, signal handling, and graceful
//! teardown of active chat sessions.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use chatcast_core::registry::StreamRegistry;
use chatcast_core::Config;

pub struct ChatcastServer {
    config: Config,
    registry: Arc<StreamRegistry>,
}

impl ChatcastServer {
    pub const fn new(config: Config, registry: Arc<StreamRegistry>) -> Self {
        Self { config, registry }
    }

    /// Start the gateway and block until a shutdown signal arrives, then
    /// tear down every active session within the configured grace period.
    pub async fn start(self) -> Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let http_handle = self.start_http_server(shutdown_rx)?;

        tokio::select! {
            _ = http_handle => {
                error!("HTTP server stopped unexpectedly");
            }
            () = shutdown_signal() => {
                info!("Shutdown signal received, starting graceful shutdown...");
            }
        }

        let _ = shutdown_tx.send(true);
        self.shutdown().await;
        Ok(())
    }

    fn start_http_server(&self, shutdown_rx: watch::Receiver<bool>) -> Result<JoinHandle<()>> {
        let http_address = self.config.http_address();
        let router = chatcast_api::router(self.registry.clone());

        let handle = tokio::spawn(async move {
            let listener = match tokio::net::TcpListener::bind(&http_address).await {
                Ok(listener) => listener,
                Err(err) => {
                    error!("Failed to bind HTTP address {}: {}", http_address, err);
                    return;
                }
            };

            info!("HTTP server listening on {}", http_address);

            let mut rx = shutdown_rx;
            let graceful = async move {
                let _ = rx.changed().await;
            };

            if let Err(err) = axum::serve(listener, router)
                .with_graceful_shutdown(graceful)
                .await
            {
                error!("HTTP server error: {}", err);
            }

            info!("HTTP server shut down gracefully");
        });

        Ok(handle)
    }

    async fn shutdown(&self) {
        let active = self.registry.active_sessions();
        if active > 0 {
            info!(
                sessions = active,
                grace_seconds = self.config.server.shutdown_grace_seconds,
                "Tearing down active sessions..."
            );
        }
        self.registry.shutdown_all().await;
        info!("Chatcast server shut down complete");
    }
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C signal"),
            Err(err) => error!("Failed to install Ctrl+C handler: {}", err),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("Received SIGTERM signal");
            }
            Err(err) => error!("Failed to install SIGTERM handler: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
