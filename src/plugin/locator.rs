//! Typed service locator used for plugin discovery.
//!
//! Extensions are registered at process entry under the capability trait they
//! implement (`provide::<dyn Middleware>(..)`) and resolved once at startup.
//! Resolution order is registration order.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Map from capability type to the implementations registered for it.
#[derive(Default)]
pub struct ServiceLocator {
    services: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl ServiceLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation of capability `T`.
    pub fn provide<T>(&mut self, service: Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let slot = self
            .services
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<Arc<T>>::new()));
        if let Some(list) = slot.downcast_mut::<Vec<Arc<T>>>() {
            list.push(service);
        }
        self
    }

    /// Builder form of [`provide`](Self::provide).
    pub fn with<T>(mut self, service: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.provide(service);
        self
    }

    /// All implementations of `T`, in registration order.
    pub fn all<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<Vec<Arc<T>>>())
            .cloned()
            .unwrap_or_default()
    }

    /// The first registered implementation of `T`, if any.
    pub fn first<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services
            .get(&TypeId::of::<T>())
            .and_then(|slot| slot.downcast_ref::<Vec<Arc<T>>>())
            .and_then(|list| list.first().cloned())
    }
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceLocator")
            .field("capabilities", &self.services.len())
            .finish()
    }
}
