//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_lifecycle_transitions_total` (counter): transitions by target `state`
//! - `server_registered_endpoints` (gauge): endpoints currently published
//! - `server_hook_failures_total` (counter): failed hooks by `phase`
//! - `server_listeners_open` (gauge): listeners currently accepting

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::lifecycle::LifecycleState;

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    metrics::describe_counter!(
        "server_lifecycle_transitions_total",
        "Lifecycle state transitions by target state"
    );
    metrics::describe_gauge!(
        "server_registered_endpoints",
        "Endpoints currently published to the service registry"
    );
    metrics::describe_counter!(
        "server_hook_failures_total",
        "Startup and shutdown hooks that reported a failure"
    );
    metrics::describe_gauge!("server_listeners_open", "Listeners currently accepting connections");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_transition(state: LifecycleState) {
    metrics::counter!("server_lifecycle_transitions_total", "state" => state.as_str()).increment(1);
}

pub fn set_registered_endpoints(count: usize) {
    metrics::gauge!("server_registered_endpoints").set(count as f64);
}

pub fn record_hook_failure(phase: &'static str) {
    metrics::counter!("server_hook_failures_total", "phase" => phase).increment(1);
}

pub fn set_listeners_open(count: usize) {
    metrics::gauge!("server_listeners_open").set(count as f64);
}
