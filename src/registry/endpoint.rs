//! Published service endpoints.

use std::net::{IpAddr, SocketAddr};

use url::Url;

use crate::net::Protocol;

/// One reachable address of this service, as published to the registry.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceEndpoint {
    protocol: Protocol,
    host: IpAddr,
    port: u16,
    service_id: String,
}

impl ServiceEndpoint {
    pub fn new(protocol: Protocol, host: IpAddr, port: u16, service_id: impl Into<String>) -> Self {
        Self {
            protocol,
            host,
            port,
            service_id: service_id.into(),
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn host(&self) -> IpAddr {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// `http(s)://host:port/serviceId`
    pub fn to_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{}://{}", self.protocol.scheme(), self.socket_addr()))?;
        url.set_path(&self.service_id);
        Ok(url)
    }
}

impl std::fmt::Display for ServiceEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_url() {
            Ok(url) => f.write_str(url.as_str()),
            Err(_) => write!(f, "{}://{}", self.protocol.scheme(), self.socket_addr()),
        }
    }
}
