//! Online CA backend over an authenticated HTTP transport.
//!
//! The client trusts exactly the root certificate it was constructed with,
//! not the system store: every connection to the CA is validated against
//! that single root. Renew and revoke ride on the caller's [`Transport`]
//! so they authenticate with the credential being operated on.

use crate::api::{
    RevokeRequest, RevokeResponse, SignRequest, SignResponse, SignSshRequest, SignSshResponse,
    SshConfigRequest, SshConfigResponse, SshKeysResponse,
};
use crate::client::{CaClient, Transport};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Contract operations, used to route errors to the right taxonomy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaOperation {
    Sign,
    SignSsh,
    Renew,
    Revoke,
    SshKeys,
    SshFederation,
    SshConfig,
}

impl CaOperation {
    fn name(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::SignSsh => "sign-ssh",
            Self::Renew => "renew",
            Self::Revoke => "revoke",
            Self::SshKeys => "ssh-keys",
            Self::SshFederation => "ssh-federation",
            Self::SshConfig => "ssh-config",
        }
    }

    fn path(&self) -> &'static str {
        match self {
            Self::Sign => "/api/v1/sign",
            Self::SignSsh => "/api/v1/ssh/sign",
            Self::Renew => "/api/v1/renew",
            Self::Revoke => "/api/v1/revoke",
            Self::SshKeys => "/api/v1/ssh/keys",
            Self::SshFederation => "/api/v1/ssh/federation",
            Self::SshConfig => "/api/v1/ssh/config",
        }
    }

    /// Whether the operation changes credential state on the CA
    fn is_mutating(&self) -> bool {
        matches!(self, Self::Sign | Self::SignSsh | Self::Renew | Self::Revoke)
    }

    /// Map a CA rejection onto the operation's domain error
    fn domain_error(&self, message: String) -> Error {
        match self {
            Self::Sign | Self::SignSsh => Error::Issuance { message },
            Self::Renew => Error::Renewal { message },
            Self::Revoke => Error::Revocation { message },
            Self::SshKeys | Self::SshFederation | Self::SshConfig => Error::Transport { message },
        }
    }
}

/// CA client that communicates with a remote CA process over HTTPS
#[derive(Debug, Clone)]
pub struct OnlineCaClient {
    http: reqwest::Client,
    base_url: String,
    root_path: PathBuf,
}

impl OnlineCaClient {
    /// Connect to the CA at `ca_url`, trusting only the root certificate at
    /// `root_path`.
    ///
    /// The root file is read and parsed here; a missing or malformed file
    /// fails construction with a configuration-load error. No network I/O
    /// happens until the first operation.
    pub fn connect(ca_url: &str, root_path: &Path, timeout: u64) -> Result<Self> {
        let parsed = url::Url::parse(ca_url)
            .map_err(|e| Error::transport(format!("invalid CA URL '{}': {}", ca_url, e)))?;

        let root_pem = std::fs::read(root_path).map_err(|e| {
            Error::config_load(format!(
                "failed to read root certificate {}: {}",
                root_path.display(),
                e
            ))
        })?;
        let root = reqwest::Certificate::from_pem(&root_pem).map_err(|e| {
            Error::config_load(format!(
                "invalid root certificate {}: {}",
                root_path.display(),
                e
            ))
        })?;

        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .add_root_certificate(root)
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| Error::transport(format!("failed to build HTTP client: {}", e)))?;

        let base_url = parsed.as_str().trim_end_matches('/').to_string();
        info!(ca_url = %base_url, root = %root_path.display(), "Constructed online CA client");

        Ok(Self { http, base_url, root_path: root_path.to_path_buf() })
    }

    /// Base URL of the remote CA
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Root certificate path this client validates the CA against
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn url(&self, operation: CaOperation) -> String {
        format!("{}{}", self.base_url, operation.path())
    }

    /// Send a prepared request and decode the JSON response, routing failures
    /// through the operation's error taxonomy.
    async fn execute<R: DeserializeOwned>(
        &self,
        operation: CaOperation,
        request: reqwest::RequestBuilder,
    ) -> Result<R> {
        debug!(operation = operation.name(), ca_url = %self.base_url, "Calling CA endpoint");

        let response =
            request.send().await.map_err(|e| classify_send_error(operation, &e))?;

        let status = response.status();
        debug!(operation = operation.name(), status = %status, "CA responded");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read error body>".to_string());
            return Err(operation.domain_error(format!("CA returned {}: {}", status, body)));
        }

        let body = response.text().await.map_err(|e| {
            after_accept_error(operation, format!("failed to read CA response: {}", e))
        })?;

        serde_json::from_str(&body).map_err(|e| {
            after_accept_error(operation, format!("failed to decode CA response: {}", e))
        })
    }
}

/// Classify a send-phase failure. Connection failures mean the request never
/// reached the CA and are plain transport errors; anything later on a
/// state-mutating operation leaves the outcome unknown.
fn classify_send_error(operation: CaOperation, error: &reqwest::Error) -> Error {
    if !error.is_connect() && operation.is_mutating() {
        Error::ambiguous(operation.name(), error.to_string())
    } else {
        Error::transport(error.to_string())
    }
}

/// A failure after the CA accepted the request: the mutation may have
/// committed, so mutating operations surface an ambiguous outcome.
fn after_accept_error(operation: CaOperation, message: String) -> Error {
    if operation.is_mutating() {
        Error::ambiguous(operation.name(), message)
    } else {
        Error::transport(message)
    }
}

#[async_trait]
impl CaClient for OnlineCaClient {
    async fn sign(&self, request: &SignRequest) -> Result<SignResponse> {
        self.execute(CaOperation::Sign, self.http.post(self.url(CaOperation::Sign)).json(request))
            .await
    }

    async fn sign_ssh(&self, request: &SignSshRequest) -> Result<SignSshResponse> {
        self.execute(
            CaOperation::SignSsh,
            self.http.post(self.url(CaOperation::SignSsh)).json(request),
        )
        .await
    }

    async fn renew(&self, transport: &Transport) -> Result<SignResponse> {
        self.execute(CaOperation::Renew, transport.http().post(self.url(CaOperation::Renew)))
            .await
    }

    async fn revoke(
        &self,
        request: &RevokeRequest,
        transport: &Transport,
    ) -> Result<RevokeResponse> {
        self.execute(
            CaOperation::Revoke,
            transport.http().post(self.url(CaOperation::Revoke)).json(request),
        )
        .await
    }

    async fn ssh_keys(&self) -> Result<SshKeysResponse> {
        self.execute(CaOperation::SshKeys, self.http.get(self.url(CaOperation::SshKeys))).await
    }

    async fn ssh_federation(&self) -> Result<SshKeysResponse> {
        self.execute(
            CaOperation::SshFederation,
            self.http.get(self.url(CaOperation::SshFederation)),
        )
        .await
    }

    async fn ssh_config(&self, request: &SshConfigRequest) -> Result<SshConfigResponse> {
        self.execute(
            CaOperation::SshConfig,
            self.http.post(self.url(CaOperation::SshConfig)).json(request),
        )
        .await
    }
}
