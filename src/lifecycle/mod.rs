//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     NotStarted → Starting
//!     → signal hook → startup hooks → register endpoints
//!     → assemble chain → TLS context → listeners → heartbeat on
//!     → Running
//!
//! Shutdown (shutdown.rs):
//!     Running → ShuttingDown
//!     → heartbeat off → unregister → shutdown hooks → stop listeners
//!     → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown() once
//! ```
//!
//! # Design Decisions
//! - One owned `Server` per process, shared as `Arc<Server>`
//! - State lives in a `watch` channel so callers can await `Stopped`
//! - A failed start rolls back and lands in `Stopped`; it is never retried

pub mod server;
pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use server::{Server, ServerBuilder};
pub use state::LifecycleState;
