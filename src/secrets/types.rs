//! Value types exchanged with the secrets manager.
//!
//! [`SecretDescription`] is the secret-level metadata (which stages point at
//! which versions) and [`SecretValue`] is the payload of one exact version.
//! Secret material is wrapped so that it never shows up in logs or `Debug`
//! output by accident.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string wrapper that redacts its contents in Debug, Display, and serialization.
///
/// # Security
///
/// - Debug output shows `SecretString([REDACTED])` instead of the actual value
/// - Display output shows `[REDACTED]`
/// - Serialization outputs `"[REDACTED]"` (NEVER the actual value)
/// - Deserialization works normally (accepts actual secret values)
/// - Memory is zeroed when dropped (via `zeroize`)
///
/// # Example
///
/// ```rust
/// use secretcache::SecretString;
///
/// let secret = SecretString::new("my-secret-key");
/// assert_eq!(format!("{:?}", secret), "SecretString([REDACTED])");
/// assert_eq!(secret.expose_secret(), "my-secret-key");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString(String);

impl Serialize for SecretString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("[REDACTED]")
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(SecretString(value))
    }
}

impl SecretString {
    /// Creates a new SecretString from a string value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Exposes the underlying secret value.
    ///
    /// Never log or print the result.
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// Consumes the SecretString and returns the inner value.
    pub fn into_inner(mut self) -> String {
        std::mem::take(&mut self.0)
    }

    /// Returns the length of the secret without exposing the value.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for SecretString {}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl Default for SecretString {
    fn default() -> Self {
        Self::new("")
    }
}

/// Secret-level metadata returned by `DescribeSecret`.
///
/// Only the stage mapping matters to the cache; the backing service guarantees
/// that a stage is attached to at most one version at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDescription {
    /// Secret name as reported by the backend
    pub name: Option<String>,

    /// Version identifier to the stages currently attached to it
    pub version_ids_to_stages: HashMap<String, Vec<String>>,
}

impl SecretDescription {
    /// Create an empty description for the named secret.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: Some(name.into()), version_ids_to_stages: HashMap::new() }
    }

    /// Attach a version and its stages.
    pub fn with_version<I, S>(mut self, version_id: impl Into<String>, stages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.version_ids_to_stages
            .insert(version_id.into(), stages.into_iter().map(Into::into).collect());
        self
    }

    /// Find the version that currently carries `stage`.
    pub fn version_id_for_stage(&self, stage: &str) -> Option<&str> {
        self.version_ids_to_stages
            .iter()
            .find(|(_, stages)| stages.iter().any(|s| s == stage))
            .map(|(version_id, _)| version_id.as_str())
    }
}

/// Payload of one secret version returned by `GetSecretValue`.
///
/// At most one of `secret_string` and `secret_binary` is populated by a
/// well-behaved backend.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretValue {
    /// Secret name as reported by the backend
    pub name: Option<String>,

    /// Version identifier of this payload
    pub version_id: Option<String>,

    /// Stages attached to the version when it was fetched
    pub version_stages: Vec<String>,

    /// Text payload
    pub secret_string: Option<SecretString>,

    /// Binary payload
    pub secret_binary: Option<Vec<u8>>,
}

impl SecretValue {
    /// A value holding a text payload.
    pub fn string(value: impl Into<SecretString>) -> Self {
        let mut secret = Self::default();
        secret.secret_string = Some(value.into());
        secret
    }

    /// A value holding a binary payload.
    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        let mut secret = Self::default();
        secret.secret_binary = Some(value.into());
        secret
    }

    /// Set the version identifier.
    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Set the secret name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("name", &self.name)
            .field("version_id", &self.version_id)
            .field("version_stages", &self.version_stages)
            .field("secret_string", &self.secret_string)
            .field("secret_binary", &self.secret_binary.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Drop for SecretValue {
    fn drop(&mut self) {
        if let Some(bytes) = self.secret_binary.as_mut() {
            bytes.zeroize();
        }
    }
}
