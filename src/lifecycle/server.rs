//! The server handle and its builder.
//!
//! # Responsibilities
//! - Own the configuration, resolved plugins and running listeners
//! - Hold the lifecycle state and apply transitions atomically
//! - Let callers observe the state and wait for `Stopped`

use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::config::ServerConfig;
use crate::lifecycle::LifecycleState;
use crate::net::{FileMaterialSource, MaterialSource, Protocol, RunningServer};
use crate::observability::metrics;
use crate::plugin::ServiceLocator;
use crate::registry::{RegistrationManager, ServiceEndpoint, ServiceRegistry, SwitchBoard};

/// One service host. Built once at process entry and shared as `Arc<Server>`.
pub struct Server {
    pub(super) config: ServerConfig,
    pub(super) plugins: ServiceLocator,
    pub(super) material: Arc<dyn MaterialSource>,
    pub(super) registration: RegistrationManager,
    pub(super) state: watch::Sender<LifecycleState>,
    pub(super) shutdown_pending: AtomicBool,
    pub(super) signals_installed: AtomicBool,
    pub(super) handle_signals: bool,
    pub(super) listeners: Mutex<Option<RunningServer>>,
}

impl Server {
    pub fn builder(config: ServerConfig) -> ServerBuilder {
        ServerBuilder {
            config,
            plugins: ServiceLocator::new(),
            material: None,
            switches: None,
            handle_signals: true,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Resolve once the server reaches `Stopped`.
    pub async fn wait(&self) {
        let mut rx = self.subscribe();
        let _ = rx.wait_for(|state| state.is_terminal()).await;
    }

    /// Addresses of the listeners currently open.
    pub fn local_addrs(&self) -> Vec<(Protocol, SocketAddr)> {
        self.listeners
            .lock()
            .expect("listener mutex poisoned")
            .as_ref()
            .map(RunningServer::local_addrs)
            .unwrap_or_default()
    }

    /// Endpoints currently published to the registry.
    pub fn registered_endpoints(&self) -> Vec<ServiceEndpoint> {
        self.registration.registered()
    }

    /// Apply `next` to the current state under the state lock.
    ///
    /// Returns the previous state when `next` produced a new one, otherwise
    /// the unchanged current state as the error.
    pub(super) fn update(
        &self,
        next: impl FnOnce(LifecycleState) -> Option<LifecycleState>,
    ) -> Result<LifecycleState, LifecycleState> {
        let mut outcome = Err(LifecycleState::NotStarted);
        let mut reached = None;
        self.state.send_if_modified(|current| match next(*current) {
            Some(to) => {
                outcome = Ok(*current);
                reached = Some(to);
                *current = to;
                true
            }
            None => {
                outcome = Err(*current);
                false
            }
        });

        if let (Ok(from), Some(to)) = (outcome, reached) {
            metrics::record_transition(to);
            tracing::debug!(from = %from, to = %to, "Lifecycle transition");
        }
        outcome
    }

    pub(super) fn transition(
        &self,
        from: LifecycleState,
        to: LifecycleState,
    ) -> Result<LifecycleState, LifecycleState> {
        self.update(|current| (current == from).then_some(to))
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("state", &self.state())
            .field("listeners", &self.local_addrs())
            .field("plugins", &self.plugins)
            .finish()
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    config: ServerConfig,
    plugins: ServiceLocator,
    material: Option<Arc<dyn MaterialSource>>,
    switches: Option<Arc<SwitchBoard>>,
    handle_signals: bool,
}

impl ServerBuilder {
    /// Extensions discovered at startup: handler providers, middleware,
    /// hooks and the service registry.
    pub fn plugins(mut self, plugins: ServiceLocator) -> Self {
        self.plugins = plugins;
        self
    }

    /// Where keystores and truststores are read from. Defaults to the
    /// configured `materialDirs` on disk.
    pub fn material_source(mut self, source: Arc<dyn MaterialSource>) -> Self {
        self.material = Some(source);
        self
    }

    /// Switch board holding the heartbeat switch. Defaults to the process-wide board.
    pub fn switches(mut self, switches: Arc<SwitchBoard>) -> Self {
        self.switches = Some(switches);
        self
    }

    /// Install the SIGINT/SIGTERM hook on start. On by default.
    pub fn handle_signals(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }

    pub fn build(self) -> Arc<Server> {
        let material = self
            .material
            .unwrap_or_else(|| Arc::new(FileMaterialSource::new(self.config.material_dirs.iter())));
        let switches = self.switches.unwrap_or_else(SwitchBoard::global);
        let registry = self.plugins.first::<dyn ServiceRegistry>();
        let (state, _) = watch::channel(LifecycleState::NotStarted);

        Arc::new(Server {
            registration: RegistrationManager::new(registry, switches),
            config: self.config,
            plugins: self.plugins,
            material,
            state,
            shutdown_pending: AtomicBool::new(false),
            signals_installed: AtomicBool::new(false),
            handle_signals: self.handle_signals,
            listeners: Mutex::new(None),
        })
    }
}
