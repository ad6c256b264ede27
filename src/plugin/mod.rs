//! Plugin subsystem.
//!
//! # Data Flow
//! ```text
//! process entry
//!     → locator.rs (register providers, middleware, hooks, registry)
//!
//! start()
//!     → hooks.rs (startup hooks, best effort)
//!     → chain.rs (first HandlerProvider → root, enabled Middleware around it)
//!     → ProcessingChain handed to the listener manager
//!
//! shutdown()
//!     → hooks.rs (shutdown hooks, isolated)
//! ```
//!
//! # Design Decisions
//! - Discovery is explicit registration, resolved once at startup
//! - One capability trait per extension kind; dynamic dispatch via `Arc<dyn _>`
//! - Chain order equals discovery order

pub mod chain;
pub mod handler;
pub mod hooks;
pub mod locator;

pub use chain::{assemble_chain, ProcessingChain};
pub use handler::{handler_fn, Handler, HandlerProvider, HttpHandler, Middleware, RouterHandler};
pub use hooks::{HookError, ShutdownHook, StartupHook};
pub use locator::ServiceLocator;
