//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server.toml
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!     → owned by the Server for its whole lifetime
//! ```
//!
//! # Design Decisions
//! - Config is read-only once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ServerConfig;
pub use validation::{validate_config, ValidationError};
