//! Service registration subsystem.
//!
//! # Data Flow
//! ```text
//! start() (enableRegistry)
//!     → manager.rs (resolve local address, one ServiceEndpoint per protocol)
//!     → ServiceRegistry::register (external directory)
//!     → listeners up → switch.rs (heartbeat on)
//!
//! shutdown()
//!     → switch.rs (heartbeat off)
//!     → manager.rs → ServiceRegistry::unregister (exactly what was registered)
//! ```
//!
//! # Design Decisions
//! - The registry is resolved from the service locator; absence is fatal
//! - No retries here: retry policy belongs to the registry client
//! - Unregistering is idempotent

pub mod endpoint;
pub mod manager;
pub mod memory;
pub mod switch;

pub use endpoint::ServiceEndpoint;
pub use manager::{RegisteredEndpoints, RegistrationManager};
pub use memory::InMemoryRegistry;
pub use switch::{SwitchBoard, REGISTRY_HEARTBEAT};

/// Error reported by a registry client.
#[derive(Debug, Clone, thiserror::Error)]
#[error("registry operation failed for {endpoint}: {reason}")]
pub struct RegistryError {
    pub endpoint: String,
    pub reason: String,
}

impl RegistryError {
    pub fn new(endpoint: &ServiceEndpoint, reason: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }
}

/// External directory mapping service identity to reachable endpoints.
///
/// Calls may block; there is no timeout around them.
pub trait ServiceRegistry: Send + Sync + 'static {
    fn register(&self, endpoint: &ServiceEndpoint) -> Result<(), RegistryError>;

    fn unregister(&self, endpoint: &ServiceEndpoint) -> Result<(), RegistryError>;
}
