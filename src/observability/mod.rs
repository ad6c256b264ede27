//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle / plugin / net / registry
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout (pretty, json or compact)
//!     → Prometheus scrape endpoint (optional, metricsAddress)
//! ```
//!
//! # Design Decisions
//! - Metric updates go through the facade; without an installed recorder they are no-ops
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod metrics;
