//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the termination hook, then run startup hooks
//! - Register endpoints, assemble the chain, build TLS, open listeners
//! - Turn the heartbeat on last
//!
//! # Design Decisions
//! - Fail fast: any step error aborts the sequence, nothing is retried
//! - A failed start closes opened listeners, withdraws endpoints registered
//!   in this attempt and leaves the server `Stopped`
//! - A shutdown requested while starting runs once start finishes

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::config::validate_config;
use crate::error::{Result, ServerError};
use crate::http::build_service;
use crate::lifecycle::{LifecycleState, Server};
use crate::net::{build_tls_context, start_listeners};
use crate::plugin::{assemble_chain, hooks, StartupHook};

impl Server {
    /// Bring the server up. Valid only once, from `NotStarted`.
    pub async fn start(self: &Arc<Self>) -> Result<()> {
        if let Err(state) = self.transition(LifecycleState::NotStarted, LifecycleState::Starting) {
            tracing::warn!(state = %state, "Start requested in invalid state");
            return Err(ServerError::InvalidState {
                operation: "start",
                state,
            });
        }

        if self.handle_signals {
            self.install_signal_hook();
        }

        match self.bring_up().await {
            Ok(()) => {
                if self.transition(LifecycleState::Starting, LifecycleState::Running).is_ok() {
                    tracing::info!(
                        service_id = %self.config.service_id,
                        listeners = ?self.local_addrs(),
                        "Server started"
                    );
                }
                if self.shutdown_pending.swap(false, Ordering::SeqCst) {
                    tracing::info!("Running shutdown requested during startup");
                    self.shutdown().await;
                }
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    service_id = %self.config.service_id,
                    error = %e,
                    "Server startup failed"
                );
                self.registration.unregister_all();
                self.stop().await;
                self.shutdown_pending.store(false, Ordering::SeqCst);
                let _ = self.transition(LifecycleState::Starting, LifecycleState::Stopped);
                Err(e)
            }
        }
    }

    async fn bring_up(&self) -> Result<()> {
        let config = &self.config;

        validate_config(config).map_err(|errors| {
            for error in &errors {
                tracing::error!(field = error.field, message = %error.message, "Invalid configuration");
            }
            ServerError::Configuration(errors)
        })?;

        hooks::run_startup_hooks(&self.plugins.all::<dyn StartupHook>())?;

        if config.enable_registry {
            let endpoints = self.registration.register(config)?;
            tracing::debug!(endpoints = endpoints.iter().count(), "Endpoints registered");
        }

        let chain = assemble_chain(&self.plugins)?;

        let tls = if config.enable_https {
            Some(build_tls_context(config, self.material.as_ref())?)
        } else {
            None
        };

        let app = build_service(&chain, config);
        let running = start_listeners(config, app, tls.as_ref()).await?;
        *self.listeners.lock().expect("listener mutex poisoned") = Some(running);

        if config.enable_registry {
            self.registration.activate_heartbeat();
        }
        Ok(())
    }
}
