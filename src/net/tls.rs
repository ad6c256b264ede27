//! TLS context construction from key and trust material.
//!
//! # Responsibilities
//! - Load the keystore (certificate chain + private key) by name
//! - Load the truststore when two-way TLS is enabled
//! - Bind the context to the configured protocol version(s)
//!
//! # Client certificate policy
//! With `enableTwoWayTls` the listener requires a client certificate and
//! validates it against the truststore. Without it, client certificates are
//! neither requested nor validated: any client may connect. That is the
//! intended behaviour for parity with existing deployments, but it is
//! insecure on untrusted networks, and a warning is logged every time such a
//! context is built.
//!
//! Every failure here is a configuration error: nothing falls back, nothing
//! is retried.

use std::sync::Arc;

use axum_server::tls_rustls::RustlsConfig;
use rustls::crypto::aws_lc_rs;
use pkcs8::der::pem;
use pkcs8::EncryptedPrivateKeyInfo;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, SupportedProtocolVersion};

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::net::material::MaterialSource;

/// How client certificates are treated by the TLS listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientAuth {
    /// Client certificates are not requested; every client is accepted.
    TrustAll,
    /// Client certificates are required and verified against the truststore.
    Verify,
}

/// Material owned by the builder while the context is constructed.
struct TlsMaterial {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    roots: Option<RootCertStore>,
}

/// A ready-to-use server TLS context, shared read-only by all connections.
#[derive(Clone)]
pub struct TlsContext {
    config: Arc<rustls::ServerConfig>,
    client_auth: ClientAuth,
}

impl TlsContext {
    pub fn client_auth(&self) -> ClientAuth {
        self.client_auth
    }

    pub fn server_config(&self) -> Arc<rustls::ServerConfig> {
        self.config.clone()
    }

    /// Acceptor configuration for `axum-server`.
    pub fn rustls_config(&self) -> RustlsConfig {
        RustlsConfig::from_config(self.config.clone())
    }
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext")
            .field("client_auth", &self.client_auth)
            .field("alpn", &self.config.alpn_protocols.len())
            .finish()
    }
}

/// Build the TLS context for the HTTPS listener.
pub fn build_tls_context(config: &ServerConfig, source: &dyn MaterialSource) -> Result<TlsContext> {
    let material = load_material(config, source)?;
    let provider = Arc::new(aws_lc_rs::default_provider());
    let versions = protocol_versions(config.tls_protocol.as_deref())?;

    let builder = rustls::ServerConfig::builder_with_provider(provider.clone())
        .with_protocol_versions(versions)
        .map_err(|e| fail(&config.keystore_name, e))?;

    let (builder, client_auth) = match material.roots {
        Some(roots) => {
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()
                .map_err(|e| fail(&config.truststore_name, e))?;
            (builder.with_client_cert_verifier(verifier), ClientAuth::Verify)
        }
        None => {
            tracing::warn!(
                keystore = %config.keystore_name,
                "Two-way TLS disabled: client certificates are not validated, every client is trusted"
            );
            (builder.with_no_client_auth(), ClientAuth::TrustAll)
        }
    };

    let mut server_config = builder
        .with_single_cert(material.certs, material.key)
        .map_err(|e| fail(&config.keystore_name, e))?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::info!(
        keystore = %config.keystore_name,
        client_auth = ?client_auth,
        protocol = config.tls_protocol.as_deref().unwrap_or("TLSv1.2+TLSv1.3"),
        "TLS context created"
    );

    Ok(TlsContext {
        config: Arc::new(server_config),
        client_auth,
    })
}

fn load_material(config: &ServerConfig, source: &dyn MaterialSource) -> Result<TlsMaterial> {
    let keystore = read(source, &config.keystore_name)?;
    let certs = parse_certs(&config.keystore_name, &keystore)?;
    let key = parse_key(&config.keystore_name, &keystore, key_password(config))?;

    let roots = if config.enable_two_way_tls {
        let truststore = read(source, &config.truststore_name)?;
        if !config.truststore_pass.is_empty() {
            tracing::warn!(
                truststore = %config.truststore_name,
                "truststorePass has no effect, PEM truststores carry no integrity seal"
            );
        }
        let mut roots = RootCertStore::empty();
        for cert in parse_certs(&config.truststore_name, &truststore)? {
            roots
                .add(cert)
                .map_err(|e| fail(&config.truststore_name, e))?;
        }
        Some(roots)
    } else {
        None
    };

    Ok(TlsMaterial { certs, key, roots })
}

fn read(source: &dyn MaterialSource, name: &str) -> Result<Vec<u8>> {
    source.load(name).map_err(|e| fail(name, format!("unable to load: {}", e)))
}

fn parse_certs(name: &str, pem: &[u8]) -> Result<Vec<CertificateDer<'static>>> {
    let certs = rustls_pemfile::certs(&mut &pem[..])
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| fail(name, format!("malformed PEM: {}", e)))?;

    if certs.is_empty() {
        return Err(fail(name, "no certificates found"));
    }
    Ok(certs)
}

/// Password protecting the private key: `keyPass`, else `keystorePass`.
fn key_password(config: &ServerConfig) -> Option<&str> {
    [config.key_pass.as_str(), config.keystore_pass.as_str()]
        .into_iter()
        .find(|pass| !pass.is_empty())
}

fn parse_key(name: &str, pem: &[u8], password: Option<&str>) -> Result<PrivateKeyDer<'static>> {
    if let Some(block) = pem_block(pem, "ENCRYPTED PRIVATE KEY") {
        let password = password.ok_or_else(|| fail(name, "private key is encrypted but no keyPass is configured"))?;
        return decrypt_key(name, block, password);
    }

    match rustls_pemfile::private_key(&mut &pem[..]) {
        Ok(Some(_)) if password.is_some() => Err(fail(
            name,
            "a key password is configured but the private key is not encrypted",
        )),
        Ok(Some(key)) => Ok(key),
        Ok(None) => Err(fail(name, "no private key found")),
        Err(e) => Err(fail(name, format!("malformed private key: {}", e))),
    }
}

/// Decrypt a PKCS#8 `EncryptedPrivateKeyInfo` (PBES2) block.
fn decrypt_key(name: &str, block: &[u8], password: &str) -> Result<PrivateKeyDer<'static>> {
    let (_, der) = pem::decode_vec(block).map_err(|e| fail(name, format!("malformed encrypted key: {}", e)))?;
    let info = EncryptedPrivateKeyInfo::try_from(der.as_slice())
        .map_err(|e| fail(name, format!("malformed encrypted key: {}", e)))?;
    let document = info
        .decrypt(password)
        .map_err(|_| fail(name, "unable to decrypt private key: wrong password or unsupported cipher"))?;

    Ok(PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(document.as_bytes().to_vec())))
}

/// The first PEM block labelled `label`, armour included.
fn pem_block<'a>(pem: &'a [u8], label: &str) -> Option<&'a [u8]> {
    let begin = format!("-----BEGIN {}-----", label);
    let end = format!("-----END {}-----", label);
    let start = find(pem, begin.as_bytes())?;
    let stop = start + find(&pem[start..], end.as_bytes())? + end.len();
    Some(&pem[start..stop])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn protocol_versions(protocol: Option<&str>) -> Result<&'static [&'static SupportedProtocolVersion]> {
    static TLS12_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS12];
    static TLS13_ONLY: &[&SupportedProtocolVersion] = &[&rustls::version::TLS13];

    match protocol {
        None => Ok(rustls::DEFAULT_VERSIONS),
        Some("TLSv1.2") => Ok(TLS12_ONLY),
        Some("TLSv1.3") => Ok(TLS13_ONLY),
        Some(other) => Err(ServerError::Configuration(vec![crate::config::ValidationError {
            field: "tlsProtocol",
            message: format!("unsupported protocol '{}'", other),
        }])),
    }
}

fn fail(resource: &str, reason: impl ToString) -> ServerError {
    let err = ServerError::key_material(resource, reason);
    tracing::error!(resource, error = %err, "Unable to create TLS context");
    err
}
