//! # Error Handling
//!
//! Error types for CA client operations, defined with `thiserror`. The
//! selector and the contract surface are thin: backend errors pass through
//! unchanged, and only missing-field context is added during selection.

/// Custom result type for CA client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CA client operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A required configuration value was absent or empty for the selected mode
    #[error("Missing configuration value for '{field}'")]
    MissingConfig { field: String },

    /// CA configuration or key material exists but cannot be loaded
    #[error("Failed to load CA configuration: {message}")]
    ConfigLoad { message: String },

    /// The backend rejected a certificate-signing request
    #[error("Certificate issuance failed: {message}")]
    Issuance { message: String },

    /// The credential presented for renewal is not eligible
    #[error("Certificate renewal failed: {message}")]
    Renewal { message: String },

    /// The target credential could not be revoked
    #[error("Certificate revocation failed: {message}")]
    Revocation { message: String },

    /// Communication with a remote CA failed before the request was accepted
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// A state-mutating operation failed in a way that leaves its outcome
    /// unknown; callers should re-query CA state rather than blindly retry
    #[error("Outcome of '{operation}' is unknown: {message}")]
    AmbiguousOutcome { operation: String, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing-configuration error for the named field
    pub fn missing_config<S: Into<String>>(field: S) -> Self {
        Self::MissingConfig { field: field.into() }
    }

    /// Create a configuration-load error
    pub fn config_load<S: Into<String>>(message: S) -> Self {
        Self::ConfigLoad { message: message.into() }
    }

    /// Create an issuance error
    pub fn issuance<S: Into<String>>(message: S) -> Self {
        Self::Issuance { message: message.into() }
    }

    /// Create a renewal error
    pub fn renewal<S: Into<String>>(message: S) -> Self {
        Self::Renewal { message: message.into() }
    }

    /// Create a revocation error
    pub fn revocation<S: Into<String>>(message: S) -> Self {
        Self::Revocation { message: message.into() }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Create an ambiguous-outcome error for the named operation
    pub fn ambiguous<O: Into<String>, S: Into<String>>(operation: O, message: S) -> Self {
        Self::AmbiguousOutcome { operation: operation.into(), message: message.into() }
    }
}
