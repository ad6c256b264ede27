//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that enabled features have the settings they need
//! - Validate value ranges (ports, pool sizes)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::IpAddr;

use crate::config::schema::ServerConfig;

/// Supported values of `tlsProtocol`.
pub const TLS_PROTOCOLS: &[&str] = &["TLSv1.2", "TLSv1.3"];

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Render a list of problems as one line.
pub fn describe(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.ip.parse::<IpAddr>().is_err() {
        errors.push(ValidationError::new("ip", format!("'{}' is not an IP address", config.ip)));
    }

    if config.enable_http && config.http_port == 0 {
        errors.push(ValidationError::new("httpPort", "must be non-zero when enableHttp is set"));
    }

    if config.enable_https {
        if config.https_port == 0 {
            errors.push(ValidationError::new("httpsPort", "must be non-zero when enableHttps is set"));
        }
        if config.keystore_name.trim().is_empty() {
            errors.push(ValidationError::new("keystoreName", "required when enableHttps is set"));
        }
        if config.enable_two_way_tls && config.truststore_name.trim().is_empty() {
            errors.push(ValidationError::new("truststoreName", "required when enableTwoWayTls is set"));
        }
    }

    if config.enable_http && config.enable_https && config.http_port == config.https_port {
        errors.push(ValidationError::new(
            "httpsPort",
            format!("conflicts with httpPort ({})", config.http_port),
        ));
    }

    if config.enable_registry && config.service_id.trim().is_empty() {
        errors.push(ValidationError::new("serviceId", "required when enableRegistry is set"));
    }

    if let Some(protocol) = &config.tls_protocol {
        if !TLS_PROTOCOLS.contains(&protocol.as_str()) {
            errors.push(ValidationError::new(
                "tlsProtocol",
                format!("unsupported protocol '{}', expected one of {:?}", protocol, TLS_PROTOCOLS),
            ));
        }
    }

    if config.io_threads == 0 {
        errors.push(ValidationError::new("ioThreads", "must be greater than zero"));
    }
    if config.worker_threads == 0 {
        errors.push(ValidationError::new("workerThreads", "must be greater than zero"));
    }
    if config.backlog == 0 {
        errors.push(ValidationError::new("backlog", "must be greater than zero"));
    }
    if config.buffer_size == 0 {
        errors.push(ValidationError::new("bufferSize", "must be greater than zero"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
