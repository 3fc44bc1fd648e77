//! Secrets manager client trait.

use async_trait::async_trait;

use super::types::{SecretDescription, SecretValue};
use crate::errors::Result;

/// The two secrets manager operations the cache depends on.
///
/// Authentication, transport, request signing and retries are the
/// implementation's business. The cache calls these methods only while
/// refreshing an entry, never while constructing one, and never holds a
/// container lock across a call.
///
/// # Security Considerations
///
/// - Implementations MUST NOT log secret values
/// - Network communication MUST use TLS
///
/// # Example Implementation
///
/// ```rust
/// use async_trait::async_trait;
/// use secretcache::{Result, SecretDescription, SecretValue, SecretsManagerClient};
///
/// struct StaticClient;
///
/// #[async_trait]
/// impl SecretsManagerClient for StaticClient {
///     async fn describe_secret(&self, secret_id: &str) -> Result<SecretDescription> {
///         Ok(SecretDescription::new(secret_id).with_version("v1", ["AWSCURRENT"]))
///     }
///
///     async fn get_secret_value(&self, _secret_id: &str, version_id: &str) -> Result<SecretValue> {
///         Ok(SecretValue::string("hunter2").with_version_id(version_id))
///     }
/// }
/// ```
#[async_trait]
pub trait SecretsManagerClient: Send + Sync {
    /// Describe a secret, returning which stages point at which versions.
    ///
    /// # Errors
    ///
    /// - [`SecretCacheError::SecretNotFound`](crate::SecretCacheError::SecretNotFound)
    ///   if the secret doesn't exist
    /// - [`SecretCacheError::Backend`](crate::SecretCacheError::Backend) for any
    ///   other failure
    async fn describe_secret(&self, secret_id: &str) -> Result<SecretDescription>;

    /// Fetch the payload of one exact version of a secret.
    ///
    /// # Errors
    ///
    /// - [`SecretCacheError::SecretNotFound`](crate::SecretCacheError::SecretNotFound)
    ///   if the secret or version doesn't exist
    /// - [`SecretCacheError::Backend`](crate::SecretCacheError::Backend) for any
    ///   other failure
    async fn get_secret_value(&self, secret_id: &str, version_id: &str) -> Result<SecretValue>;
}
