//! # Error Handling
//!
//! Error types for secret cache operations, defined with `thiserror`.
//!
//! Errors produced by a refresh are stored on the cache entry that attempted it
//! and handed back to every reader until the entry refreshes again, so the type
//! is `Clone` and carries messages rather than boxed sources.

use thiserror::Error;

/// Result type for secret cache operations.
pub type Result<T> = std::result::Result<T, SecretCacheError>;

/// Errors that can occur while reading secrets through the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretCacheError {
    /// The cache configuration is unusable (for example a negative TTL).
    #[error("Invalid cache configuration: {message}")]
    InvalidConfig { message: String },

    /// The secrets manager reported that the secret does not exist.
    #[error("Secret not found: {secret_id}")]
    SecretNotFound { secret_id: String },

    /// Any other failure reported by the secrets manager client.
    #[error("Secrets manager error: {message}")]
    Backend { message: String },

    /// The requested version stage does not point at any known version.
    #[error("could not find secret version for versionStage {stage}")]
    VersionNotFound { stage: String },

    /// The cached value does not hold the requested representation.
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

impl SecretCacheError {
    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig { message: message.into() }
    }

    /// Create a secret not found error.
    pub fn secret_not_found(secret_id: impl Into<String>) -> Self {
        Self::SecretNotFound { secret_id: secret_id.into() }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into() }
    }

    /// Create a version not found error.
    pub fn version_not_found(stage: impl Into<String>) -> Self {
        Self::VersionNotFound { stage: stage.into() }
    }

    /// Create an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation { message: message.into() }
    }

    /// Whether this error was caused by the cache configuration.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }

    /// Whether this error originated in the secrets manager client.
    pub fn is_backend_error(&self) -> bool {
        matches!(self, Self::Backend { .. } | Self::SecretNotFound { .. })
    }

    /// Whether the requested stage could not be resolved to a version.
    pub fn is_version_not_found(&self) -> bool {
        matches!(self, Self::VersionNotFound { .. })
    }

    /// Whether the caller asked for a representation the value does not hold.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, Self::InvalidOperation { .. })
    }
}

impl From<serde_json::Error> for SecretCacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_operation(format!("secret string is not valid JSON: {}", err))
    }
}
