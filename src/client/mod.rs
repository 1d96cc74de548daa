//! # CA Client Contract and Backend Selection
//!
//! One capability surface, two interchangeable backends: [`OnlineCaClient`]
//! reaches a remote CA over an authenticated transport, [`OfflineCaClient`]
//! performs the same operations locally against CA material on disk. The
//! selector resolves a [`ClientConfig`] into exactly one constructed backend;
//! downstream code never branches on mode again.

pub mod offline;
pub mod online;
mod ssh;
pub mod transport;

pub use offline::{OfflineCaClient, OfflineConfig, SshSection};
pub use online::OnlineCaClient;
pub use transport::{Transport, TransportConfig};

use crate::api::{
    RevokeRequest, RevokeResponse, SignRequest, SignResponse, SignSshRequest, SignSshResponse,
    SshConfigRequest, SshConfigResponse, SshKeysResponse,
};
use crate::config::{self, ClientConfig, OperatingMode};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

/// Operations every CA backend must support.
///
/// Implementations must be `Send + Sync`: a single constructed client may be
/// reused across concurrent certificate operations. Each operation is a
/// single logical transaction; a backend that cannot tell whether a
/// state-mutating operation committed surfaces
/// [`Error::AmbiguousOutcome`](crate::errors::Error::AmbiguousOutcome)
/// instead of guessing.
#[async_trait]
pub trait CaClient: Send + Sync + std::fmt::Debug {
    /// Submit a certificate-signing request and return the issued chain
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse>;

    /// Submit an SSH certificate-signing request
    async fn sign_ssh(&self, request: &SignSshRequest) -> Result<SignSshResponse>;

    /// Renew the credential authenticating the supplied transport
    async fn renew(&self, transport: &Transport) -> Result<SignResponse>;

    /// Revoke a previously issued credential, authenticated via the transport
    async fn revoke(
        &self,
        request: &RevokeRequest,
        transport: &Transport,
    ) -> Result<RevokeResponse>;

    /// Retrieve the CA's current SSH host/user signing public keys
    async fn ssh_keys(&self) -> Result<SshKeysResponse>;

    /// Retrieve SSH public keys from federated CAs trusted by this CA
    async fn ssh_federation(&self) -> Result<SshKeysResponse>;

    /// Retrieve recommended SSH configuration for the requesting class
    async fn ssh_config(&self, request: &SshConfigRequest) -> Result<SshConfigResponse>;
}

/// A CA client bound to one backend at construction time.
///
/// The variant is chosen once by the selector and never changes; operations
/// dispatch statically to the underlying backend.
#[derive(Debug)]
pub enum CaConnection {
    Online(OnlineCaClient),
    Offline(OfflineCaClient),
}

impl CaConnection {
    /// Resolve the configuration into exactly one constructed backend.
    ///
    /// Validation order: offline mode requires `offline_config`; online mode
    /// requires `ca_url` and a root certificate, auto-resolved from
    /// [`config::default_root_ca_path`] when no explicit path is given.
    /// Missing fields fail with
    /// [`Error::MissingConfig`](crate::errors::Error::MissingConfig); backend
    /// construction errors propagate unchanged.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::with_root_resolver(config, config::default_root_ca_path)
    }

    /// Like [`from_config`](Self::from_config), with an injected default
    /// root-path resolver so callers and tests can substitute deterministic
    /// locations.
    ///
    /// An explicitly supplied root path is deliberately not existence-checked
    /// here: it is validated by the online backend at connection time. Only
    /// the implicit default is stat-checked before being trusted as found.
    pub fn with_root_resolver<F>(config: &ClientConfig, default_root: F) -> Result<Self>
    where
        F: FnOnce() -> PathBuf,
    {
        match config.mode {
            OperatingMode::Offline => {
                let path = config::non_empty_path(config.offline_config.clone())
                    .ok_or_else(|| Error::missing_config("ca-config"))?;

                debug!(path = %path.display(), "Selecting offline CA backend");
                Ok(Self::Offline(OfflineCaClient::load(&path)?))
            }
            OperatingMode::Online => {
                let ca_url = config::non_empty(config.ca_url.clone())
                    .ok_or_else(|| Error::missing_config("ca-url"))?;

                let root = match config::non_empty_path(config.root.clone()) {
                    Some(path) => path,
                    None => {
                        let fallback = default_root();
                        if !fallback.exists() {
                            return Err(Error::missing_config("root"));
                        }
                        debug!(root = %fallback.display(), "Using default root certificate");
                        fallback
                    }
                };

                debug!(ca_url = %ca_url, root = %root.display(), "Selecting online CA backend");
                Ok(Self::Online(OnlineCaClient::connect(&ca_url, &root, config.timeout)?))
            }
        }
    }

    /// Mode this connection was constructed in
    pub fn mode(&self) -> OperatingMode {
        match self {
            Self::Online(_) => OperatingMode::Online,
            Self::Offline(_) => OperatingMode::Offline,
        }
    }
}

#[async_trait]
impl CaClient for CaConnection {
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse> {
        match self {
            Self::Online(client) => client.sign(request).await,
            Self::Offline(client) => client.sign(request).await,
        }
    }

    async fn sign_ssh(&self, request: &SignSshRequest) -> Result<SignSshResponse> {
        match self {
            Self::Online(client) => client.sign_ssh(request).await,
            Self::Offline(client) => client.sign_ssh(request).await,
        }
    }

    async fn renew(&self, transport: &Transport) -> Result<SignResponse> {
        match self {
            Self::Online(client) => client.renew(transport).await,
            Self::Offline(client) => client.renew(transport).await,
        }
    }

    async fn revoke(
        &self,
        request: &RevokeRequest,
        transport: &Transport,
    ) -> Result<RevokeResponse> {
        match self {
            Self::Online(client) => client.revoke(request, transport).await,
            Self::Offline(client) => client.revoke(request, transport).await,
        }
    }

    async fn ssh_keys(&self) -> Result<SshKeysResponse> {
        match self {
            Self::Online(client) => client.ssh_keys().await,
            Self::Offline(client) => client.ssh_keys().await,
        }
    }

    async fn ssh_federation(&self) -> Result<SshKeysResponse> {
        match self {
            Self::Online(client) => client.ssh_federation().await,
            Self::Offline(client) => client.ssh_federation().await,
        }
    }

    async fn ssh_config(&self, request: &SshConfigRequest) -> Result<SshConfigResponse> {
        match self {
            Self::Online(client) => client.ssh_config(request).await,
            Self::Offline(client) => client.ssh_config(request).await,
        }
    }
}
