//! Plaintext and TLS listeners bound to the processing chain.
//!
//! # Responsibilities
//! - Bind `(ip, httpPort)` and/or `(ip, httpsPort)` with the configured
//!   accept backlog and receive buffer size
//! - Serve the HTTP service on every bound socket
//! - Stop all listeners gracefully, idempotently
//!
//! # Design Decisions
//! - Every socket is bound before any is served, so a bind failure leaves
//!   nothing open (already-bound sockets are dropped with the error)
//! - With neither protocol enabled the manager starts with zero listeners
//! - `Date` is always emitted by hyper; nothing here disables it

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum_server::Handle;
use tokio::net::TcpSocket;
use tokio::task::JoinHandle;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::net::tls::TlsContext;
use crate::net::Protocol;
use crate::observability::metrics;

/// Socket-level tunables applied to each listener.
#[derive(Debug, Clone, Copy)]
pub struct SocketSettings {
    pub backlog: u32,
    pub recv_buffer_size: u32,
}

impl From<&ServerConfig> for SocketSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            backlog: config.backlog,
            recv_buffer_size: config.buffer_size,
        }
    }
}

/// One serving listener.
struct ActiveListener {
    protocol: Protocol,
    address: SocketAddr,
    handle: Handle,
    task: JoinHandle<io::Result<()>>,
}

/// The set of listeners opened by one `start_listeners` call.
pub struct RunningServer {
    listeners: Vec<ActiveListener>,
    grace: Duration,
}

impl RunningServer {
    /// Bound addresses, in start order (plaintext first).
    pub fn local_addrs(&self) -> Vec<(Protocol, SocketAddr)> {
        self.listeners
            .iter()
            .map(|listener| (listener.protocol, listener.address))
            .collect()
    }

    pub fn is_running(&self) -> bool {
        !self.listeners.is_empty()
    }

    /// Stop accepting, let in-flight requests finish within the grace
    /// period, then close. Calling this again is a no-op.
    pub async fn stop(&mut self) {
        let listeners = std::mem::take(&mut self.listeners);
        if listeners.is_empty() {
            return;
        }

        for listener in &listeners {
            listener.handle.graceful_shutdown(Some(self.grace));
        }

        for listener in listeners {
            match listener.task.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(
                    protocol = %listener.protocol,
                    address = %listener.address,
                    error = %e,
                    "Listener exited with error"
                ),
                Err(e) => tracing::warn!(
                    protocol = %listener.protocol,
                    address = %listener.address,
                    error = %e,
                    "Listener task failed"
                ),
            }
            tracing::info!(protocol = %listener.protocol, address = %listener.address, "Listener stopped");
        }
        metrics::set_listeners_open(0);
    }
}

impl std::fmt::Debug for RunningServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunningServer")
            .field("listeners", &self.local_addrs())
            .finish()
    }
}

/// Open the listeners enabled in `config` and serve `app` on them.
///
/// `tls` must be present when `enableHttps` is set.
pub async fn start_listeners(
    config: &ServerConfig,
    app: Router,
    tls: Option<&TlsContext>,
) -> Result<RunningServer> {
    let settings = SocketSettings::from(config);

    let plain = if config.enable_http {
        let address = config.http_address();
        let socket = bind(&address, settings)?;
        let local = local_addr(&socket, &address)?;
        Some((socket, local))
    } else {
        None
    };

    let secure = if config.enable_https {
        let tls = tls.ok_or_else(|| {
            ServerError::key_material(&config.keystore_name, "HTTPS enabled without a TLS context")
        })?;
        let address = config.https_address();
        let socket = bind(&address, settings)?;
        let local = local_addr(&socket, &address)?;
        Some((socket, local, tls.rustls_config()))
    } else {
        None
    };

    // Nothing is spawned until every socket is bound and addressed.
    let mut listeners = Vec::new();

    if let Some((socket, address)) = plain {
        let handle = Handle::new();
        let server = axum_server::from_tcp(socket).handle(handle.clone());
        let service = app.clone().into_make_service();
        let task = tokio::spawn(async move { server.serve(service).await });
        tracing::info!(ip = %config.ip, port = address.port(), "Http Server started");
        listeners.push(ActiveListener {
            protocol: Protocol::Plain,
            address,
            handle,
            task,
        });
    }

    if let Some((socket, address, rustls)) = secure {
        let handle = Handle::new();
        let server = axum_server::tls_rustls::from_tcp_rustls(socket, rustls).handle(handle.clone());
        let service = app.into_make_service();
        let task = tokio::spawn(async move { server.serve(service).await });
        tracing::info!(ip = %config.ip, port = address.port(), "Https Server started");
        listeners.push(ActiveListener {
            protocol: Protocol::Tls,
            address,
            handle,
            task,
        });
    }

    if listeners.is_empty() {
        tracing::warn!("Neither HTTP nor HTTPS is enabled, no listener opened");
    }
    metrics::set_listeners_open(listeners.len());

    Ok(RunningServer {
        listeners,
        grace: Duration::from_millis(config.shutdown_grace_ms),
    })
}

/// Bind a socket with the configured backlog and receive buffer.
pub fn bind(address: &str, settings: SocketSettings) -> Result<std::net::TcpListener> {
    let bind_error = |source: io::Error| {
        tracing::error!(address, error = %source, "Unable to bind listener");
        ServerError::Bind {
            address: address.to_string(),
            source,
        }
    };

    let addr: SocketAddr = address
        .parse()
        .map_err(|e| bind_error(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(bind_error)?;

    socket.set_reuseaddr(true).map_err(bind_error)?;
    socket
        .set_recv_buffer_size(settings.recv_buffer_size)
        .map_err(bind_error)?;
    socket.bind(addr).map_err(bind_error)?;

    let listener = socket.listen(settings.backlog).map_err(bind_error)?;
    listener.into_std().map_err(bind_error)
}

fn local_addr(socket: &std::net::TcpListener, address: &str) -> Result<SocketAddr> {
    socket.local_addr().map_err(|source| ServerError::Bind {
        address: address.to_string(),
        source,
    })
}
