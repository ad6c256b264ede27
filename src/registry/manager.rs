//! Endpoint registration lifecycle.
//!
//! # Responsibilities
//! - Resolve the local reachable address once
//! - Publish one endpoint per enabled protocol
//! - Turn the heartbeat switch on only after registration succeeded
//! - Unregister exactly what was registered, at most once

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::net::Protocol;
use crate::observability::metrics;
use crate::registry::switch::{SwitchBoard, REGISTRY_HEARTBEAT};
use crate::registry::{ServiceEndpoint, ServiceRegistry};

/// Endpoints published by one `register` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisteredEndpoints {
    pub http: Option<ServiceEndpoint>,
    pub https: Option<ServiceEndpoint>,
}

impl RegisteredEndpoints {
    pub fn iter(&self) -> impl Iterator<Item = &ServiceEndpoint> {
        self.http.iter().chain(self.https.iter())
    }
}

/// Publishes and withdraws this process's endpoints.
pub struct RegistrationManager {
    registry: Option<Arc<dyn ServiceRegistry>>,
    switches: Arc<SwitchBoard>,
    registered: Mutex<Vec<ServiceEndpoint>>,
    registration_succeeded: AtomicBool,
}

impl RegistrationManager {
    pub fn new(registry: Option<Arc<dyn ServiceRegistry>>, switches: Arc<SwitchBoard>) -> Self {
        Self {
            registry,
            switches,
            registered: Mutex::new(Vec::new()),
            registration_succeeded: AtomicBool::new(false),
        }
    }

    /// Register one endpoint per enabled protocol.
    ///
    /// Registry failures propagate unchanged; endpoints published before the
    /// failure stay tracked so they can be withdrawn.
    pub fn register(&self, config: &ServerConfig) -> Result<RegisteredEndpoints> {
        let registry = self.registry.as_ref().ok_or_else(|| {
            tracing::error!(
                service_id = %config.service_id,
                "Could not find registry instance in service locator"
            );
            ServerError::RegistryUnavailable
        })?;

        let host = resolve_local_address(&config.ip);
        let mut endpoints = RegisteredEndpoints::default();

        if config.enable_http {
            let endpoint = ServiceEndpoint::new(Protocol::Plain, host, config.http_port, &config.service_id);
            self.publish(registry.as_ref(), &endpoint)?;
            endpoints.http = Some(endpoint);
        }
        if config.enable_https {
            let endpoint = ServiceEndpoint::new(Protocol::Tls, host, config.https_port, &config.service_id);
            self.publish(registry.as_ref(), &endpoint)?;
            endpoints.https = Some(endpoint);
        }

        self.registration_succeeded.store(true, Ordering::SeqCst);
        Ok(endpoints)
    }

    fn publish(&self, registry: &dyn ServiceRegistry, endpoint: &ServiceEndpoint) -> Result<()> {
        registry.register(endpoint).map_err(|e| {
            tracing::error!(endpoint = %endpoint, error = %e, "Failed to register endpoint");
            e
        })?;

        let mut registered = self.registered.lock().expect("registration mutex poisoned");
        registered.push(endpoint.clone());
        metrics::set_registered_endpoints(registered.len());
        tracing::info!(endpoint = %endpoint, "Registered service endpoint");
        Ok(())
    }

    /// Turn the heartbeat switch on. Refused unless registration succeeded.
    pub fn activate_heartbeat(&self) -> bool {
        if !self.registration_succeeded.load(Ordering::SeqCst) {
            tracing::warn!("Heartbeat not activated: endpoints are not registered");
            return false;
        }
        self.switches.set(REGISTRY_HEARTBEAT, true);
        tracing::info!("Registry heart beat switcher is on");
        true
    }

    pub fn deactivate_heartbeat(&self) {
        if self.switches.is_on(REGISTRY_HEARTBEAT) {
            self.switches.set(REGISTRY_HEARTBEAT, false);
            tracing::info!("Registry heart beat switcher is off");
        }
    }

    /// Withdraw the given endpoints. Endpoints that are not currently
    /// registered are skipped. Returns how many were withdrawn.
    pub fn unregister<'a>(&self, endpoints: impl IntoIterator<Item = &'a ServiceEndpoint>) -> usize {
        let mut withdrawn = 0;
        for endpoint in endpoints {
            let was_registered = {
                let mut registered = self.registered.lock().expect("registration mutex poisoned");
                match registered.iter().position(|existing| existing == endpoint) {
                    Some(index) => {
                        registered.remove(index);
                        metrics::set_registered_endpoints(registered.len());
                        true
                    }
                    None => false,
                }
            };

            if !was_registered {
                tracing::debug!(endpoint = %endpoint, "Endpoint not registered, skipping");
                continue;
            }

            // registered implies a registry was resolved
            if let Some(registry) = &self.registry {
                match registry.unregister(endpoint) {
                    Ok(()) => tracing::info!(endpoint = %endpoint, "Unregistered service endpoint"),
                    Err(e) => tracing::warn!(endpoint = %endpoint, error = %e, "Failed to unregister endpoint"),
                }
            }
            withdrawn += 1;
        }
        withdrawn
    }

    /// Withdraw everything registered so far.
    pub fn unregister_all(&self) -> usize {
        let endpoints = self.registered();
        self.unregister(endpoints.iter())
    }

    /// Endpoints currently registered, in registration order.
    pub fn registered(&self) -> Vec<ServiceEndpoint> {
        self.registered.lock().expect("registration mutex poisoned").clone()
    }
}

/// Address other hosts can reach this process on.
///
/// A concrete bind address is used as-is. For a wildcard bind the outbound
/// interface address is probed (no packet is sent) in the bind's address
/// family; that family's loopback is the fallback.
pub fn resolve_local_address(bind_ip: &str) -> IpAddr {
    let parsed = bind_ip.parse::<IpAddr>().ok();
    if let Some(ip) = parsed.filter(|ip| !ip.is_unspecified()) {
        return ip;
    }

    let (local, remote, loopback) = match parsed {
        Some(IpAddr::V6(_)) => ("[::]:0", "[2001:4860:4860::8888]:80", IpAddr::V6(Ipv6Addr::LOCALHOST)),
        _ => ("0.0.0.0:0", "8.8.8.8:80", IpAddr::V4(Ipv4Addr::LOCALHOST)),
    };

    let probe = UdpSocket::bind(local).and_then(|socket| {
        socket.connect(remote)?;
        socket.local_addr()
    });

    match probe {
        Ok(addr) if !addr.ip().is_unspecified() => addr.ip(),
        Ok(_) | Err(_) => {
            tracing::debug!(loopback = %loopback, "No routable interface found, publishing loopback address");
            loopback
        }
    }
}
