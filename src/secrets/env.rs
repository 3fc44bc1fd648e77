//! Environment variable secrets manager client.
//!
//! Reads secrets from environment variables with the `SECRETCACHE_SECRET_`
//! prefix. It's intended for **development and testing only** - NOT for
//! production use.
//!
//! ```bash
//! export SECRETCACHE_SECRET_DB_PASSWORD="hunter2"
//! ```
//!
//! Each variable is exposed as a secret with a single synthetic version,
//! [`ENV_VERSION_ID`], carrying the default version stage. Because the version
//! identifier never changes, a cached value is only re-read from the
//! environment after the version entry is evicted.

use async_trait::async_trait;
use std::env;

use super::client::SecretsManagerClient;
use super::types::{SecretDescription, SecretValue};
use crate::config::DEFAULT_VERSION_STAGE;
use crate::errors::{Result, SecretCacheError};

/// Environment variable prefix for secrets.
const SECRET_PREFIX: &str = "SECRETCACHE_SECRET_";

/// Version identifier reported for every environment-backed secret.
pub const ENV_VERSION_ID: &str = "ENVIRONMENT";

/// Environment variable secrets manager client (development only).
///
/// # Security
///
/// **DO NOT use in production.** Environment variables are visible in process
/// listings and provide no encryption, access control or versioning.
#[derive(Debug, Clone, Default)]
pub struct EnvVarSecretsClient {}

impl EnvVarSecretsClient {
    /// Creates a new environment variable secrets client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a secret identifier to the environment variable name.
    ///
    /// Characters that are not valid in variable names (`-`, `/`, `.`) become `_`.
    fn secret_id_to_env_var(secret_id: &str) -> String {
        let normalized: String = secret_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();
        format!("{}{}", SECRET_PREFIX, normalized)
    }

    fn read(secret_id: &str) -> Result<String> {
        let env_var = Self::secret_id_to_env_var(secret_id);
        env::var(&env_var).map_err(|_| SecretCacheError::secret_not_found(secret_id))
    }
}

#[async_trait]
impl SecretsManagerClient for EnvVarSecretsClient {
    async fn describe_secret(&self, secret_id: &str) -> Result<SecretDescription> {
        Self::read(secret_id)?;
        Ok(SecretDescription::new(secret_id).with_version(ENV_VERSION_ID, [DEFAULT_VERSION_STAGE]))
    }

    async fn get_secret_value(&self, secret_id: &str, version_id: &str) -> Result<SecretValue> {
        if version_id != ENV_VERSION_ID {
            return Err(SecretCacheError::secret_not_found(format!("{}:{}", secret_id, version_id)));
        }

        let mut value = SecretValue::string(Self::read(secret_id)?)
            .with_name(secret_id)
            .with_version_id(ENV_VERSION_ID);
        value.version_stages = vec![DEFAULT_VERSION_STAGE.to_string()];
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_id_to_env_var() {
        assert_eq!(
            EnvVarSecretsClient::secret_id_to_env_var("db_password"),
            "SECRETCACHE_SECRET_DB_PASSWORD"
        );
        assert_eq!(
            EnvVarSecretsClient::secret_id_to_env_var("prod/api-key"),
            "SECRETCACHE_SECRET_PROD_API_KEY"
        );
    }

    #[tokio::test]
    async fn test_describe_secret_not_found() {
        let client = EnvVarSecretsClient::new();
        let result = client.describe_secret("nonexistent_secret").await;
        assert!(matches!(result.unwrap_err(), SecretCacheError::SecretNotFound { .. }));
    }

    #[tokio::test]
    async fn test_describe_and_get_from_env() {
        env::set_var("SECRETCACHE_SECRET_ENV_CLIENT_KEY", "test-value");

        let client = EnvVarSecretsClient::new();
        let description = client.describe_secret("env_client_key").await.unwrap();
        assert_eq!(description.version_id_for_stage(DEFAULT_VERSION_STAGE), Some(ENV_VERSION_ID));

        let value = client.get_secret_value("env_client_key", ENV_VERSION_ID).await.unwrap();
        assert_eq!(value.secret_string.as_ref().unwrap().expose_secret(), "test-value");
        assert!(value.secret_binary.is_none());

        env::remove_var("SECRETCACHE_SECRET_ENV_CLIENT_KEY");
    }

    #[tokio::test]
    async fn test_unknown_version_rejected() {
        env::set_var("SECRETCACHE_SECRET_ENV_VERSION_KEY", "test-value");

        let client = EnvVarSecretsClient::new();
        let result = client.get_secret_value("env_version_key", "v2").await;
        assert!(result.unwrap_err().is_backend_error());

        env::remove_var("SECRETCACHE_SECRET_ENV_VERSION_KEY");
    }
}
