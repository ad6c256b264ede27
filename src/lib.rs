//! Pluggable HTTP(S) service host.
//!
//! Brings a service up and down around externally supplied plugins: a root
//! handler, middleware, startup and shutdown hooks and a service registry.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod plugin;
pub mod registry;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use lifecycle::{LifecycleState, Server, ServerBuilder};
pub use plugin::ServiceLocator;
