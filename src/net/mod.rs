//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! keystoreName / truststoreName
//!     → material.rs (resolve bytes by logical name)
//!     → tls.rs (rustls ServerConfig, client-auth policy)
//!
//! ProcessingChain (as an axum service) + optional TlsContext
//!     → listener.rs (bind all sockets, then serve; stop gracefully)
//! ```
//!
//! # Design Decisions
//! - TLS failures are fatal configuration errors, never a silent fallback
//! - Listener startup is all-or-nothing
//! - The TLS context is built once and shared read-only

pub mod listener;
pub mod material;
pub mod tls;

pub use listener::{start_listeners, RunningServer};
pub use material::{FileMaterialSource, MaterialSource, MemoryMaterialSource};
pub use tls::{build_tls_context, ClientAuth, TlsContext};

/// Transport protocol of a listener or published endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plaintext HTTP.
    Plain,
    /// HTTP over TLS.
    Tls,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Plain => "plain",
            Protocol::Tls => "tls",
        }
    }

    /// URL scheme spoken on this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Plain => "http",
            Protocol::Tls => "https",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
