//! Shutdown coordination.
//!
//! # Responsibilities
//! - Run the shutdown sequence at most once
//! - Withdraw endpoints before any other cleanup
//! - Close listeners gracefully
//!
//! # Design Decisions
//! - The state check and the claim of the sequence happen under one lock,
//!   so concurrent callers cannot interleave its steps
//! - Shutdown hook failures never block the final stop

use std::sync::atomic::Ordering;

use crate::lifecycle::{LifecycleState, Server};
use crate::plugin::{hooks, ShutdownHook};

impl Server {
    /// Unregister endpoints, run shutdown hooks, then stop listeners.
    ///
    /// Repeated or concurrent calls are absorbed. Called while starting, the
    /// shutdown is deferred until `start()` returns.
    pub async fn shutdown(&self) {
        let claimed = self.update(|current| match current {
            LifecycleState::Running => Some(LifecycleState::ShuttingDown),
            LifecycleState::NotStarted => Some(LifecycleState::Stopped),
            LifecycleState::Starting => {
                self.shutdown_pending.store(true, Ordering::SeqCst);
                None
            }
            LifecycleState::ShuttingDown | LifecycleState::Stopped => None,
        });

        match claimed {
            Ok(LifecycleState::Running) => {}
            Ok(_) => {
                tracing::info!("Shutdown before start, server stopped");
                return;
            }
            Err(LifecycleState::Starting) => {
                tracing::info!("Shutdown requested while starting, deferred");
                return;
            }
            Err(state) => {
                tracing::debug!(state = %state, "Shutdown already in progress or complete");
                return;
            }
        }

        tracing::info!(service_id = %self.config.service_id, "Shutting down server");

        self.registration.deactivate_heartbeat();
        self.registration.unregister_all();

        tracing::info!("Cleaning up before server shutdown");
        let failures = hooks::run_shutdown_hooks(&self.plugins.all::<dyn ShutdownHook>());
        if failures > 0 {
            tracing::warn!(failures, "Some shutdown hooks failed");
        }

        self.stop().await;
        let _ = self.transition(LifecycleState::ShuttingDown, LifecycleState::Stopped);
        tracing::info!("Server stopped");
    }

    /// Close every open listener. Idempotent; does not change the lifecycle state.
    pub async fn stop(&self) {
        let running = self.listeners.lock().expect("listener mutex poisoned").take();
        if let Some(mut running) = running {
            running.stop().await;
        }
    }
}
