//! # CA Protocol Payloads
//!
//! Request and response types exchanged with a certificate authority. The
//! client core treats these as pass-through data: requests are owned by the
//! caller, responses are allocated by the backend and handed back. Field
//! names follow the CA's JSON wire format (camelCase).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request to sign an X.509 certificate-signing request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// PEM-encoded PKCS#10 certificate-signing request
    pub csr: String,

    /// One-time authorization token, if the CA requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Requested start of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Requested end of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
}

/// Issued certificate chain returned by sign and renew operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignResponse {
    /// PEM-encoded leaf certificate
    pub certificate: String,

    /// PEM-encoded root certificate of the issuing CA
    pub ca_certificate: String,

    /// Full PEM chain, leaf first
    pub certificate_chain: Vec<String>,
}

/// Request to revoke a previously issued certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    /// Serial number of the certificate to revoke (hex, colons optional)
    pub serial: String,

    /// Human-readable revocation reason
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// RFC 5280 reason code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<u32>,

    /// One-time authorization token, if the CA requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Acknowledgement of a revocation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeResponse {
    pub status: String,
}

/// Kind of SSH certificate being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshCertType {
    User,
    Host,
}

impl SshCertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Host => "host",
        }
    }
}

impl FromStr for SshCertType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "host" => Ok(Self::Host),
            _ => Err(format!("Unknown SSH certificate type: {}", s)),
        }
    }
}

impl fmt::Display for SshCertType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request to sign an SSH certificate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignSshRequest {
    /// Subject public key in OpenSSH authorized-keys format
    pub public_key: String,

    /// User or host certificate
    pub cert_type: SshCertType,

    /// Key identity embedded in the certificate
    pub key_id: String,

    /// Principals the certificate is valid for; empty means all
    #[serde(default)]
    pub principals: Vec<String>,

    /// Requested start of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_after: Option<DateTime<Utc>>,

    /// Requested end of the validity window
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_before: Option<DateTime<Utc>>,

    /// One-time authorization token, if the CA requires one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Issued SSH certificate in OpenSSH format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignSshResponse {
    pub certificate: String,
}

/// SSH signing public keys published by the CA
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshKeysResponse {
    /// User CA public keys in authorized-keys format
    #[serde(default)]
    pub user_keys: Vec<String>,

    /// Host CA public keys in authorized-keys format
    #[serde(default)]
    pub host_keys: Vec<String>,
}

/// Request for recommended SSH configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfigRequest {
    pub cert_type: SshCertType,
}

/// A named SSH configuration snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfigSnippet {
    pub name: String,
    pub content: String,
}

/// Recommended SSH configuration for the requesting host/user class
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshConfigResponse {
    #[serde(default)]
    pub snippets: Vec<SshConfigSnippet>,
}
