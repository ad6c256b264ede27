//! Error taxonomy for the service host.
//!
//! Every variant is fatal to `start()`: the sequence aborts, opened listeners
//! are closed and the error is returned to the caller. Recoverable hook
//! failures never become a `ServerError`; they are logged where they happen.
//! Nothing here is retried internally.

use crate::config::validation::{describe, ValidationError};
use crate::lifecycle::LifecycleState;
use crate::plugin::HookError;
use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Missing or invalid settings.
    #[error("configuration error: {}", describe(.0))]
    Configuration(Vec<ValidationError>),

    /// Keystore or truststore could not be located, parsed or used.
    #[error("key material error ({resource}): {reason}")]
    KeyMaterial { resource: String, reason: String },

    /// No handler provider yielded a root handler.
    #[error("no route handler provider available")]
    NoRouteHandler,

    /// Registry is enabled but no registry instance is resolvable.
    #[error("registry enabled but no registry instance is available")]
    RegistryUnavailable,

    /// A listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A startup hook raised an unrecoverable failure.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// Publishing an endpoint to the registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The requested transition is not valid from the current state.
    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
}

impl ServerError {
    pub(crate) fn key_material(resource: impl Into<String>, reason: impl ToString) -> Self {
        Self::KeyMaterial {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
