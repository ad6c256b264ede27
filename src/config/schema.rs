//! Configuration schema definitions.
//!
//! Option names follow the camelCase keys operators already use in
//! `server.toml` (`enableHttp`, `httpsPort`, `keystoreName`, ...).
//! Every field has a default so a minimal file only names what it changes.

use serde::{Deserialize, Serialize};

/// Root configuration for the service host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Open a plaintext listener on `httpPort`.
    pub enable_http: bool,

    /// Open a TLS listener on `httpsPort`.
    pub enable_https: bool,

    pub http_port: u16,

    pub https_port: u16,

    /// Address both listeners bind to.
    pub ip: String,

    /// Publish endpoints to the service registry at startup.
    pub enable_registry: bool,

    /// Require and verify client certificates against the truststore.
    pub enable_two_way_tls: bool,

    /// Logical name of the PEM keystore (certificate chain + private key).
    pub keystore_name: String,

    pub keystore_pass: String,

    /// Logical name of the PEM truststore (CA certificates).
    pub truststore_name: String,

    pub truststore_pass: String,

    pub key_pass: String,

    /// Identifier published with every registered endpoint.
    pub service_id: String,

    /// Directories searched, in order, when resolving key material by name.
    pub material_dirs: Vec<String>,

    /// Pin the TLS protocol ("TLSv1.2" or "TLSv1.3"); both are offered when unset.
    pub tls_protocol: Option<String>,

    /// Value of the outbound `Server` header.
    pub server_string: String,

    /// Runtime threads driving socket I/O.
    pub io_threads: usize,

    /// Upper bound on requests executing the chain concurrently.
    pub worker_threads: usize,

    /// Accept backlog passed to `listen(2)`.
    pub backlog: u32,

    /// Socket receive buffer size in bytes.
    pub buffer_size: u32,

    /// Advertise `Connection: keep-alive` on HTTP/1.1 responses.
    pub always_set_keep_alive: bool,

    /// Track per-request start time and latency (tower-http trace layer).
    pub record_request_start_time: bool,

    /// Deadline for in-flight requests when listeners are stopped.
    pub shutdown_grace_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format (pretty, json, compact).
    pub log_format: String,

    /// Prometheus scrape endpoint bind address; metrics export is off when unset.
    pub metrics_address: Option<String>,
}

/// Default runtime I/O threads: twice the available hardware parallelism.
pub fn default_io_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(2)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enable_http: true,
            enable_https: false,
            http_port: 8080,
            https_port: 8443,
            ip: "0.0.0.0".to_string(),
            enable_registry: false,
            enable_two_way_tls: false,
            keystore_name: "server.keystore.pem".to_string(),
            keystore_pass: String::new(),
            truststore_name: "server.truststore.pem".to_string(),
            truststore_pass: String::new(),
            key_pass: String::new(),
            service_id: String::new(),
            material_dirs: vec!["config".to_string(), ".".to_string()],
            tls_protocol: None,
            server_string: "service-host".to_string(),
            io_threads: default_io_threads(),
            worker_threads: 200,
            backlog: 10_000,
            buffer_size: 16 * 1024,
            always_set_keep_alive: false,
            record_request_start_time: false,
            shutdown_grace_ms: 5_000,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_address: None,
        }
    }
}

impl ServerConfig {
    /// `ip:httpPort`; IPv6 addresses are bracketed.
    pub fn http_address(&self) -> String {
        self.address(self.http_port)
    }

    /// `ip:httpsPort`; IPv6 addresses are bracketed.
    pub fn https_address(&self) -> String {
        self.address(self.https_port)
    }

    fn address(&self, port: u16) -> String {
        match self.ip.parse::<std::net::IpAddr>() {
            Ok(ip) => std::net::SocketAddr::new(ip, port).to_string(),
            Err(_) => format!("{}:{}", self.ip, port),
        }
    }
}
