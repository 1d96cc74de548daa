//! # Configuration Management
//!
//! Resolved inputs needed to construct a CA client backend, plus the helpers
//! that resolve them from explicit values, `~/.certplane/config.toml`, and
//! `CERTPLANE_*` environment variables. The selector consumes a fully
//! resolved [`ClientConfig`]; how the values were sourced is irrelevant to it.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Operating mode of the CA client, chosen once per client lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// Talk to a remote CA over an authenticated transport
    Online,
    /// Operate locally against CA configuration and key material on disk
    Offline,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

impl FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(format!("Unknown operating mode: {}", s)),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved inputs for constructing a CA client backend.
///
/// Exactly the fields required by the selected mode must be non-empty:
/// `ca_url` (and a root certificate, possibly auto-resolved) for
/// [`OperatingMode::Online`], `offline_config` for
/// [`OperatingMode::Offline`]. Empty strings are treated the same as absent
/// values.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Online or offline operation
    pub mode: OperatingMode,

    /// Base URL of the remote CA (required when online)
    pub ca_url: Option<String>,

    /// Path to the trusted root certificate (online; auto-resolved from the
    /// default location when absent)
    pub root: Option<PathBuf>,

    /// Path to the offline CA configuration file (required when offline)
    pub offline_config: Option<PathBuf>,

    /// Request timeout in seconds for network operations
    pub timeout: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::Online,
            ca_url: None,
            root: None,
            offline_config: None,
            timeout: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Build a config by resolving each value through the flag, config-file
    /// and environment sources.
    pub fn resolve(
        mode: OperatingMode,
        ca_url: Option<String>,
        root: Option<PathBuf>,
        offline_config: Option<PathBuf>,
        timeout: Option<u64>,
    ) -> Self {
        Self {
            mode,
            ca_url: resolve_ca_url(ca_url),
            root: resolve_root(root),
            offline_config: resolve_offline_config(offline_config),
            timeout: resolve_timeout(timeout),
        }
    }
}

/// Persisted client configuration stored in ~/.certplane/config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Base URL of the remote CA
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_url: Option<String>,

    /// Path to the trusted root certificate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,

    /// Path to the offline CA configuration file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_config: Option<PathBuf>,

    /// Request timeout in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl FileConfig {
    /// Get the default configuration file path (~/.certplane/config.toml)
    pub fn config_path() -> Result<PathBuf> {
        let home = home_dir()
            .ok_or_else(|| Error::config_load("Unable to determine home directory"))?;

        Ok(home.join(".certplane").join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config_load(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents).map_err(|e| {
            Error::config_load(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::config_load(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, contents)?;

        Ok(())
    }
}

/// Resolve the CA URL from multiple sources
///
/// Checks sources in the following priority order:
/// 1. Explicit value (e.g. a command-line flag)
/// 2. ~/.certplane/config.toml
/// 3. CERTPLANE_CA_URL environment variable
pub fn resolve_ca_url(explicit: Option<String>) -> Option<String> {
    if let Some(url) = non_empty(explicit) {
        debug!(ca_url = %url, "Using explicitly supplied CA URL");
        return Some(url);
    }

    if let Ok(config) = FileConfig::load() {
        if let Some(url) = non_empty(config.ca_url) {
            debug!(ca_url = %url, "Using CA URL from config file");
            return Some(url);
        }
    }

    if let Ok(url) = std::env::var("CERTPLANE_CA_URL") {
        if let Some(url) = non_empty(Some(url)) {
            debug!(ca_url = %url, "Using CA URL from CERTPLANE_CA_URL environment variable");
            return Some(url);
        }
    }

    None
}

/// Resolve the root certificate path from the explicit value, the config
/// file, or the CERTPLANE_ROOT environment variable, in that order.
pub fn resolve_root(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = non_empty_path(explicit) {
        return Some(path);
    }

    if let Ok(config) = FileConfig::load() {
        if let Some(path) = non_empty_path(config.root) {
            debug!(root = %path.display(), "Using root certificate path from config file");
            return Some(path);
        }
    }

    if let Ok(path) = std::env::var("CERTPLANE_ROOT") {
        if let Some(path) = non_empty_path(Some(PathBuf::from(path))) {
            debug!(root = %path.display(), "Using root certificate path from CERTPLANE_ROOT");
            return Some(path);
        }
    }

    None
}

/// Resolve the offline CA configuration path from the explicit value, the
/// config file, or the CERTPLANE_CA_CONFIG environment variable.
pub fn resolve_offline_config(explicit: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = non_empty_path(explicit) {
        return Some(path);
    }

    if let Ok(config) = FileConfig::load() {
        if let Some(path) = non_empty_path(config.offline_config) {
            debug!(path = %path.display(), "Using offline CA config path from config file");
            return Some(path);
        }
    }

    if let Ok(path) = std::env::var("CERTPLANE_CA_CONFIG") {
        if let Some(path) = non_empty_path(Some(PathBuf::from(path))) {
            debug!(path = %path.display(), "Using offline CA config path from CERTPLANE_CA_CONFIG");
            return Some(path);
        }
    }

    None
}

/// Resolve the timeout from the explicit value, the config file, or the
/// default of 30 seconds.
pub fn resolve_timeout(explicit: Option<u64>) -> u64 {
    if let Some(timeout) = explicit {
        debug!(timeout_secs = timeout, "Using explicitly supplied timeout");
        return timeout;
    }

    if let Ok(config) = FileConfig::load() {
        if let Some(timeout) = config.timeout {
            debug!(timeout_secs = timeout, "Using timeout from config file");
            return timeout;
        }
    }

    DEFAULT_TIMEOUT_SECS
}

/// Default location of the trusted root certificate
/// (~/.certplane/certs/root_ca.crt).
///
/// The returned path is not guaranteed to exist; the selector stat-checks it
/// before trusting it as found.
pub fn default_root_ca_path() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".certplane")
        .join("certs")
        .join("root_ca.crt")
}

/// Treat empty strings the same as absent values
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Treat empty paths the same as absent values
pub(crate) fn non_empty_path(value: Option<PathBuf>) -> Option<PathBuf> {
    value.filter(|v| !v.as_os_str().is_empty())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
