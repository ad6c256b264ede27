//! OS signal handling.
//!
//! # Responsibilities
//! - Listen for SIGINT and SIGTERM
//! - Translate the first one into a single `shutdown()` call
//!
//! # Design Decisions
//! - Installed at most once per server
//! - The listener task holds a weak reference; dropping the server ends it quietly

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::lifecycle::Server;

impl Server {
    pub(super) fn install_signal_hook(self: &Arc<Self>) {
        if self.signals_installed.swap(true, Ordering::SeqCst) {
            return;
        }

        let server = Arc::downgrade(self);
        tokio::spawn(async move {
            termination().await;
            tracing::info!("Termination signal received");
            if let Some(server) = server.upgrade() {
                server.shutdown().await;
            }
        });
        tracing::debug!("Termination signal hook installed");
    }
}

async fn termination() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
