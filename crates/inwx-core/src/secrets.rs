//! Secret store collaborator trait.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Key/value payload of one secret
pub type SecretData = HashMap<String, Vec<u8>>;

/// Errors a secret store can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretStoreError {
    /// No secret with that name in the namespace
    #[error("secret not found")]
    NotFound,

    /// The store could not be read
    #[error("secret store error: {0}")]
    Backend(String),
}

/// Read-only access to namespaced secrets
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the secret `name` in `namespace`
    async fn get(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError>;
}
