//! Secrets manager collaborator abstraction.
//!
//! The cache talks to the remote secrets manager only through the
//! [`SecretsManagerClient`] trait, which has exactly two operations:
//! - **describe_secret**: which stages currently point at which versions
//! - **get_secret_value**: the payload of one exact version
//!
//! # Supported Clients
//!
//! - **In-memory**: [`InMemorySecretsClient`], call-counting and failure
//!   injection for tests
//! - **Environment Variables**: [`EnvVarSecretsClient`], development fallback
//!   using the `SECRETCACHE_SECRET_*` prefix
//!
//! Production clients (AWS SDK, Vault, ...) implement the trait in their own
//! crates and are handed to [`SecretCache::builder`](crate::SecretCache::builder).
//!
//! # Security Considerations
//!
//! - Secret values are wrapped in [`SecretString`] and never logged
//! - Binary payloads are zeroed when a [`SecretValue`] is dropped

pub mod client;
pub mod env;
pub mod memory;
pub mod types;

pub use client::SecretsManagerClient;
pub use env::EnvVarSecretsClient;
pub use memory::InMemorySecretsClient;
pub use types::{SecretDescription, SecretString, SecretValue};
