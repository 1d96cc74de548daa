//! Caller-supplied authenticated transport for renew and revoke operations.
//!
//! Renewal and revocation authenticate with the credential being operated on,
//! so the channel carrying them is owned by the caller rather than by the CA
//! client: the caller decides the identity, the timeout, and the trust roots,
//! and a cancelled or timed-out transport surfaces as a transport error
//! instead of a hang.

use crate::errors::{Error, Result};
use std::time::Duration;

use crate::config::DEFAULT_TIMEOUT_SECS;

/// Transport construction parameters
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Request timeout in seconds
    pub timeout: u64,

    /// PEM bundle holding the client certificate chain and its PKCS#8 private
    /// key, used for mutual-TLS authentication
    pub identity_pem: Option<Vec<u8>>,

    /// Additional PEM root certificate to trust when validating the CA server
    pub root_pem: Option<Vec<u8>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { timeout: DEFAULT_TIMEOUT_SECS, identity_pem: None, root_pem: None }
    }
}

/// Authenticated channel used to carry renew and revoke requests.
///
/// The transport is constructed once by the caller and may be reused across
/// operations; the CA client never mutates it.
#[derive(Clone)]
pub struct Transport {
    http: reqwest::Client,
    identity_pem: Option<Vec<u8>>,
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("identity", &self.identity_pem.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl Transport {
    /// Build a transport from the given configuration
    pub fn new(config: TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(config.timeout));

        if let Some(ref pem) = config.identity_pem {
            let identity = reqwest::Identity::from_pem(pem)
                .map_err(|e| Error::transport(format!("invalid client identity: {}", e)))?;
            builder = builder.identity(identity);
        }

        if let Some(ref pem) = config.root_pem {
            let root = reqwest::Certificate::from_pem(pem)
                .map_err(|e| Error::transport(format!("invalid root certificate: {}", e)))?;
            builder = builder.add_root_certificate(root);
        }

        let http = builder
            .build()
            .map_err(|e| Error::transport(format!("failed to build transport: {}", e)))?;

        Ok(Self { http, identity_pem: config.identity_pem })
    }

    /// The underlying HTTP client, used by the online backend to carry
    /// renew/revoke calls
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// PEM bundle of the credential authenticating this transport, if any.
    ///
    /// The offline backend reads the certificate to renew from here.
    pub fn identity_pem(&self) -> Option<&[u8]> {
        self.identity_pem.as_deref()
    }
}
