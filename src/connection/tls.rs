//! TLS policies for MySQL connections.
//!
//! A policy is built once, registered by name in a [`TlsRegistry`](super::TlsRegistry)
//! and referenced from DSNs only by that name. Policies are immutable after build,
//! so configs duplicated per target host can share one `Arc<TlsPolicy>`.

use crate::instance::InstanceKey;
use crate::metrics::{counters, labels};
use crate::{Error, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WantsClientCert;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, ConfigBuilder, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Name under which the connection TLS policy is registered and referenced from DSNs.
pub const TLS_CONFIG_KEY: &str = "ghost";

/// Options a [`TlsPolicy`] is built from.
///
/// Deserializable so TLS settings can live next to the rest of a tool's configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TlsOptions {
    /// CA certificate file in PEM format (None = system roots)
    pub ca_cert_path: Option<PathBuf>,
    /// Client certificate file for mutual TLS
    pub client_cert_path: Option<PathBuf>,
    /// Client private key file for mutual TLS
    pub client_key_path: Option<PathBuf>,
    /// Skip server certificate verification
    pub allow_insecure: bool,
}

/// Immutable TLS policy.
///
/// # Examples
///
/// ```ignore
/// use ghost_mysql::connection::TlsPolicy;
///
/// // Verify against a private CA and present a client certificate
/// let tls = TlsPolicy::builder()
///     .ca_cert_path("/etc/mysql/ca.pem")
///     .client_cert_path("/etc/mysql/client.pem")
///     .client_key_path("/etc/mysql/client-key.pem")
///     .build()?;
///
/// // Self-signed test servers (danger: disables verification)
/// let tls = TlsPolicy::builder().allow_insecure(true).build()?;
/// ```
#[derive(Clone)]
pub struct TlsPolicy {
    options: TlsOptions,
    client_config: Arc<ClientConfig>,
}

impl TlsPolicy {
    /// Create a new TLS policy builder.
    pub fn builder() -> TlsPolicyBuilder {
        TlsPolicyBuilder::default()
    }

    /// Build a policy from a full set of options.
    ///
    /// # Errors
    ///
    /// See [`TlsPolicyBuilder::build`].
    pub fn from_options(options: TlsOptions) -> Result<Self> {
        TlsPolicyBuilder { options }.build()
    }

    /// Wrap a rustls config built elsewhere. The policy reports default options.
    pub fn from_client_config(client_config: Arc<ClientConfig>) -> Self {
        Self {
            options: TlsOptions::default(),
            client_config,
        }
    }

    /// Get the rustls ClientConfig for this policy.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// Options this policy was built from.
    pub fn options(&self) -> &TlsOptions {
        &self.options
    }

    /// Check if server certificates go unverified.
    pub fn allow_insecure(&self) -> bool {
        self.options.allow_insecure
    }

    /// Check if a client certificate is presented.
    pub fn has_client_cert(&self) -> bool {
        self.client_config.client_auth_cert_resolver.has_certs()
    }
}

impl std::fmt::Debug for TlsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsPolicy")
            .field("ca_cert_path", &self.options.ca_cert_path)
            .field("client_cert_path", &self.options.client_cert_path)
            .field("client_key_path", &self.options.client_key_path)
            .field("allow_insecure", &self.options.allow_insecure)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Builder for [`TlsPolicy`].
#[derive(Debug, Default)]
pub struct TlsPolicyBuilder {
    options: TlsOptions,
}

impl TlsPolicyBuilder {
    /// Verify servers against the CA certificates in this PEM file.
    ///
    /// If not set, system root certificates are used.
    pub fn ca_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.ca_cert_path = Some(path.into());
        self
    }

    /// Present the certificate chain in this PEM file. Requires `client_key_path`.
    pub fn client_cert_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.client_cert_path = Some(path.into());
        self
    }

    /// Private key matching `client_cert_path`.
    pub fn client_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.client_key_path = Some(path.into());
        self
    }

    /// ⚠️ **DANGER**: Accept any server certificate.
    ///
    /// **NEVER use in production.** Only for servers with self-signed certificates
    /// in test environments.
    pub fn allow_insecure(mut self, allow: bool) -> Self {
        self.options.allow_insecure = allow;
        self
    }

    /// Build the TLS policy.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - a certificate or key file cannot be read
    /// - a PEM file holds no usable certificate or key
    /// - only one of client certificate and client key is set
    /// - rustls rejects the resulting configuration
    pub fn build(self) -> Result<TlsPolicy> {
        let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?;

        let (builder, mode) = if self.options.allow_insecure {
            let builder = builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(InsecureVerifier { provider }));
            (builder, labels::MODE_INSECURE)
        } else if let Some(ca_path) = &self.options.ca_cert_path {
            let roots = load_custom_ca(ca_path)?;
            (
                builder.with_root_certificates(roots),
                labels::MODE_CUSTOM_CA,
            )
        } else {
            (
                builder.with_root_certificates(load_system_roots()),
                labels::MODE_SYSTEM_ROOTS,
            )
        };

        let client_config = with_client_auth(builder, &self.options)?;

        tracing::debug!(
            mode,
            ca_cert_path = ?self.options.ca_cert_path,
            client_cert = self.options.client_cert_path.is_some(),
            "built TLS policy"
        );
        counters::tls_policy_built(mode);

        Ok(TlsPolicy {
            options: self.options,
            client_config: Arc::new(client_config),
        })
    }
}

/// Server name used for SNI and certificate verification when connecting to `key`.
///
/// # Errors
///
/// Returns an error if the hostname is empty or neither a DNS name nor an IP address.
pub fn server_name(key: &InstanceKey) -> Result<ServerName<'static>> {
    let hostname = key.hostname.trim_end_matches('.');
    if hostname.is_empty() {
        return Err(Error::Config(
            "TLS requires a hostname: server name cannot be empty".into(),
        ));
    }
    ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Config(format!("invalid hostname for TLS: '{}'", key.hostname)))
}

/// System roots, falling back to the bundled webpki roots when none can be loaded.
fn load_system_roots() -> RootCertStore {
    let result = rustls_native_certs::load_native_certs();

    let mut store = RootCertStore::empty();
    let (added, _ignored) = store.add_parsable_certificates(result.certs);
    if !result.errors.is_empty() {
        tracing::debug!(errors = result.errors.len(), "errors loading system root certificates");
    }

    if added == 0 {
        tracing::warn!("no system root certificates found, using bundled webpki roots");
        store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    }
    store
}

/// Load CA certificates from a PEM file.
fn load_custom_ca(ca_path: &Path) -> Result<RootCertStore> {
    let certs = read_certs(ca_path)?;
    if certs.is_empty() {
        return Err(Error::Config(format!(
            "could not add CA certificate to cert pool: no certificates in '{}'",
            ca_path.display()
        )));
    }

    let mut root_store = RootCertStore::empty();
    for cert in certs {
        root_store.add(cert)?;
    }
    Ok(root_store)
}

fn with_client_auth(
    builder: ConfigBuilder<ClientConfig, WantsClientCert>,
    options: &TlsOptions,
) -> Result<ClientConfig> {
    match (&options.client_cert_path, &options.client_key_path) {
        (None, None) => Ok(builder.with_no_client_auth()),
        (Some(cert_path), Some(key_path)) => {
            let certs = read_certs(cert_path)?;
            if certs.is_empty() {
                return Err(Error::Config(format!(
                    "no certificates in client certificate file '{}'",
                    cert_path.display()
                )));
            }
            let key = read_private_key(key_path)?;
            Ok(builder.with_client_auth_cert(certs, key)?)
        }
        _ => Err(Error::Config(
            "client certificate and client key must be set together".into(),
        )),
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>> {
    let data = read_pem(path)?;
    let mut reader = std::io::Cursor::new(data);
    rustls_pemfile::certs(&mut reader)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| {
            Error::Config(format!(
                "failed to parse certificates from '{}': {}",
                path.display(),
                e
            ))
        })
}

fn read_private_key(path: &Path) -> Result<PrivateKeyDer<'static>> {
    let data = read_pem(path)?;
    let mut reader = std::io::Cursor::new(data);
    rustls_pemfile::private_key(&mut reader)
        .map_err(|e| {
            Error::Config(format!(
                "failed to parse private key from '{}': {}",
                path.display(),
                e
            ))
        })?
        .ok_or_else(|| Error::Config(format!("no private key found in '{}'", path.display())))
}

/// Accepts any server certificate. Handshake signatures are still checked.
#[derive(Debug)]
struct InsecureVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn temp_pem(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn test_tls_options_defaults() {
        let options = TlsOptions::default();
        assert!(options.ca_cert_path.is_none());
        assert!(options.client_cert_path.is_none());
        assert!(options.client_key_path.is_none());
        assert!(!options.allow_insecure);
    }

    #[test]
    fn test_tls_options_deserialize() {
        let options: TlsOptions = serde_json::from_str(
            r#"{"ca_cert_path": "/etc/mysql/ca.pem", "allow_insecure": true}"#,
        )
        .unwrap();
        assert_eq!(options.ca_cert_path, Some(PathBuf::from("/etc/mysql/ca.pem")));
        assert!(options.client_cert_path.is_none());
        assert!(options.allow_insecure);
    }

    #[test]
    fn test_insecure_policy() {
        let tls = TlsPolicy::builder()
            .allow_insecure(true)
            .build()
            .expect("Failed to build TLS policy");

        assert!(tls.allow_insecure());
        assert!(!tls.has_client_cert());
        assert!(tls.options().ca_cert_path.is_none());
    }

    #[test]
    fn test_custom_ca_policy() {
        let tls = TlsPolicy::builder()
            .ca_cert_path(fixture("ca.pem"))
            .build()
            .expect("Failed to build TLS policy");

        assert!(!tls.allow_insecure());
        assert_eq!(tls.options().ca_cert_path, Some(fixture("ca.pem")));
    }

    #[test]
    fn test_client_cert_policy() {
        let tls = TlsPolicy::builder()
            .ca_cert_path(fixture("ca.pem"))
            .client_cert_path(fixture("client.pem"))
            .client_key_path(fixture("client-key.pem"))
            .build()
            .expect("Failed to build TLS policy");

        assert!(tls.has_client_cert());
    }

    #[test]
    fn test_client_cert_without_key_fails() {
        let result = TlsPolicy::builder()
            .allow_insecure(true)
            .client_cert_path(fixture("client.pem"))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let result = TlsPolicy::builder()
            .allow_insecure(true)
            .client_key_path(fixture("client-key.pem"))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_ca_file_fails() {
        let result = TlsPolicy::builder()
            .ca_cert_path("/nonexistent/ca.pem")
            .build();
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_ca_file_without_certs_fails() {
        let file = temp_pem("not a certificate\n");
        let result = TlsPolicy::builder().ca_cert_path(file.path()).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_key_file_without_key_fails() {
        let file = temp_pem("");
        let result = TlsPolicy::builder()
            .allow_insecure(true)
            .client_cert_path(fixture("client.pem"))
            .client_key_path(file.path())
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_from_options() {
        let options = TlsOptions {
            allow_insecure: true,
            ..TlsOptions::default()
        };
        let tls = TlsPolicy::from_options(options.clone()).unwrap();
        assert_eq!(tls.options(), &options);
    }

    #[test]
    fn test_from_client_config() {
        let inner = TlsPolicy::builder().allow_insecure(true).build().unwrap();
        let wrapped = TlsPolicy::from_client_config(inner.client_config());
        assert!(Arc::ptr_eq(&wrapped.client_config(), &inner.client_config()));
        assert_eq!(wrapped.options(), &TlsOptions::default());
    }

    #[test]
    fn test_server_name() {
        assert!(server_name(&InstanceKey::new("myhost", 3306)).is_ok());
        assert!(server_name(&InstanceKey::new("db.internal.example.com.", 3306)).is_ok());
        assert!(server_name(&InstanceKey::new("10.0.0.5", 3306)).is_ok());
        assert!(server_name(&InstanceKey::new("::1", 3306)).is_ok());
    }

    #[test]
    fn test_server_name_empty_fails() {
        assert!(server_name(&InstanceKey::default()).is_err());
        assert!(server_name(&InstanceKey::new("bad host", 3306)).is_err());
    }

    #[test]
    fn test_tls_policy_debug() {
        let tls = TlsPolicy::builder().allow_insecure(true).build().unwrap();
        let debug_str = format!("{:?}", tls);
        assert!(debug_str.contains("TlsPolicy"));
        assert!(debug_str.contains("allow_insecure: true"));
        assert!(debug_str.contains("<ClientConfig>"));
    }
}
