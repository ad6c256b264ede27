//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection (net::listener)
//!     → server.rs (trace? → Server header → concurrency limit → keep-alive strip)
//!     → ProcessingChain head (middleware … → root handler)
//!     → Send to client
//! ```

pub mod server;
pub mod status;

pub use server::build_service;
pub use status::StatusHandlerProvider;
