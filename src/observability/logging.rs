//! Structured logging.
//!
//! # Responsibilities
//! - Install the global tracing subscriber once
//! - Select the output format from configuration
//! - Let `RUST_LOG` override the configured level

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub mod format {
    pub const JSON: &str = "json";
    pub const PRETTY: &str = "pretty";
    pub const COMPACT: &str = "compact";
}

/// Initialize logging. Unknown formats fall back to compact output.
///
/// Fails if a global subscriber is already installed.
pub fn init(level: &str, log_format: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let layer = match log_format {
        format::JSON => fmt::layer().json().with_current_span(true).boxed(),
        format::PRETTY => fmt::layer().pretty().with_file(false).with_line_number(false).boxed(),
        _ => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry().with(filter).with(layer).try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_rejected() {
        // either this call or another test installed the subscriber first
        let _ = init("debug", format::COMPACT);
        assert!(init("info", format::JSON).is_err());
    }
}
