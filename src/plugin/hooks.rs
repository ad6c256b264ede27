//! Startup and shutdown hooks.
//!
//! # Design Decisions
//! - Hooks run in discovery order
//! - A failing or panicking hook is logged and the rest still run
//! - Only a startup hook returning [`HookError::Fatal`] aborts startup

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use crate::observability::metrics;

/// Failure reported by a hook.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookError {
    /// The hook failed but the sequence may continue.
    #[error("hook failed: {0}")]
    Failed(String),

    /// The hook failed and asks for startup to be aborted.
    #[error("unrecoverable hook failure: {0}")]
    Fatal(String),
}

/// Runs once at the very beginning of `start()`.
pub trait StartupHook: Send + Sync + 'static {
    fn on_startup(&self) -> Result<(), HookError>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Runs once during `shutdown()`, after endpoints are unregistered.
pub trait ShutdownHook: Send + Sync + 'static {
    fn on_shutdown(&self) -> Result<(), HookError>;

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Run every startup hook. Returns the first fatal failure, which stops the loop.
pub fn run_startup_hooks(hooks: &[Arc<dyn StartupHook>]) -> Result<(), HookError> {
    for hook in hooks {
        let outcome = catch_unwind(AssertUnwindSafe(|| hook.on_startup()))
            .unwrap_or_else(|_| Err(HookError::Failed("hook panicked".to_string())));

        match outcome {
            Ok(()) => tracing::debug!(hook = hook.name(), "Startup hook completed"),
            Err(HookError::Fatal(reason)) => {
                tracing::error!(hook = hook.name(), reason = %reason, "Startup hook aborted startup");
                metrics::record_hook_failure("startup");
                return Err(HookError::Fatal(reason));
            }
            Err(err) => {
                tracing::warn!(hook = hook.name(), error = %err, "Startup hook failed, continuing");
                metrics::record_hook_failure("startup");
            }
        }
    }
    Ok(())
}

/// Run every shutdown hook; failures are isolated. Returns how many failed.
pub fn run_shutdown_hooks(hooks: &[Arc<dyn ShutdownHook>]) -> usize {
    let mut failures = 0;
    for hook in hooks {
        let outcome = catch_unwind(AssertUnwindSafe(|| hook.on_shutdown()))
            .unwrap_or_else(|_| Err(HookError::Failed("hook panicked".to_string())));

        match outcome {
            Ok(()) => tracing::debug!(hook = hook.name(), "Shutdown hook completed"),
            Err(err) => {
                failures += 1;
                tracing::warn!(hook = hook.name(), error = %err, "Shutdown hook failed, continuing");
                metrics::record_hook_failure("shutdown");
            }
        }
    }
    failures
}
