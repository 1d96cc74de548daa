//! # Certplane
//!
//! Certplane is a client-side abstraction for interacting with a Certificate
//! Authority to issue, renew, revoke, and distribute X.509 and SSH
//! credentials. Callers choose an operating mode once; everything downstream
//! is backend-agnostic.
//!
//! ## Architecture
//!
//! ```text
//! ClientConfig → Backend Selector → CaConnection
//!                                      ├── OnlineCaClient  (HTTPS to a remote CA)
//!                                      └── OfflineCaClient (local CA material on disk)
//! ```
//!
//! ## Core Components
//!
//! - **CaClient contract**: the seven lifecycle operations every backend
//!   supports (sign, SSH sign, renew, revoke, SSH key/federation/config
//!   distribution)
//! - **Backend selector**: resolves configuration into exactly one
//!   constructed backend, failing fast with the missing field's name
//! - **Transport**: the caller-owned authenticated channel carrying renew
//!   and revoke requests
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use certplane::{CaClient, CaConnection, ClientConfig, OperatingMode};
//!
//! #[tokio::main]
//! async fn main() -> certplane::Result<()> {
//!     let config = ClientConfig {
//!         mode: OperatingMode::Online,
//!         ca_url: Some("https://ca.internal:9000".to_string()),
//!         root: Some("/etc/ca/root.crt".into()),
//!         ..ClientConfig::default()
//!     };
//!
//!     let client = CaConnection::from_config(&config)?;
//!     let keys = client.ssh_keys().await?;
//!     println!("user CA keys: {}", keys.user_keys.len());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod errors;

// Re-export commonly used types and traits
pub use client::{
    CaClient, CaConnection, OfflineCaClient, OfflineConfig, OnlineCaClient, SshSection, Transport,
    TransportConfig,
};
pub use config::{ClientConfig, FileConfig, OperatingMode};
pub use errors::{Error, Result};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
