//! Named process-wide boolean switches.
//!
//! The registry heartbeat subsystem polls [`REGISTRY_HEARTBEAT`] and only
//! publishes liveness while it is on.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

/// Switch turned on once endpoints are registered and listeners are up.
pub const REGISTRY_HEARTBEAT: &str = "registry.heartbeat";

static GLOBAL: OnceLock<Arc<SwitchBoard>> = OnceLock::new();

/// A set of named on/off switches. Unknown switches read as off.
#[derive(Debug, Default)]
pub struct SwitchBoard {
    switches: DashMap<String, bool>,
}

impl SwitchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The board shared by the whole process.
    pub fn global() -> Arc<SwitchBoard> {
        GLOBAL.get_or_init(|| Arc::new(SwitchBoard::new())).clone()
    }

    pub fn set(&self, name: &str, on: bool) {
        self.switches.insert(name.to_string(), on);
    }

    pub fn is_on(&self, name: &str) -> bool {
        self.switches.get(name).map(|entry| *entry.value()).unwrap_or(false)
    }
}
