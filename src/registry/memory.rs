//! In-process service registry.
//!
//! Useful for single-host deployments, embedding and tests. Endpoints are
//! grouped by service id; registering the same endpoint twice keeps one copy.

use dashmap::DashMap;

use crate::registry::{RegistryError, ServiceEndpoint, ServiceRegistry};

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    services: DashMap<String, Vec<ServiceEndpoint>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoints currently published for `service_id`.
    pub fn lookup(&self, service_id: &str) -> Vec<ServiceEndpoint> {
        self.services
            .get(service_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Total number of published endpoints.
    pub fn len(&self) -> usize {
        self.services.iter().map(|entry| entry.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ServiceRegistry for InMemoryRegistry {
    fn register(&self, endpoint: &ServiceEndpoint) -> Result<(), RegistryError> {
        let mut endpoints = self
            .services
            .entry(endpoint.service_id().to_string())
            .or_default();
        if !endpoints.contains(endpoint) {
            endpoints.push(endpoint.clone());
        }
        Ok(())
    }

    fn unregister(&self, endpoint: &ServiceEndpoint) -> Result<(), RegistryError> {
        let now_empty = match self.services.get_mut(endpoint.service_id()) {
            Some(mut endpoints) => {
                endpoints.retain(|existing| existing != endpoint);
                endpoints.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.services.remove_if(endpoint.service_id(), |_, endpoints| endpoints.is_empty());
        }
        Ok(())
    }
}
