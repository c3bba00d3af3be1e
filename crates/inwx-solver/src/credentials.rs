//! Credential resolution from inline config values and secret references.

use inwx_core::{Credentials, Result, SecretRef, SecretStore, SecretStoreError, SolverError};
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::SolverConfig;

/// Resolves [`Credentials`] for a challenge against the host's secret store.
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
}

impl CredentialResolver {
    /// Create a resolver backed by `store`
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Resolve username, password and optional OTP seed.
    ///
    /// Inline values win over references; a field with an inline value never
    /// touches the store.
    pub async fn resolve(&self, config: &SolverConfig, namespace: &str) -> Result<Credentials> {
        let username = self
            .required("username", &config.username, &config.username_ref, namespace)
            .await?;
        let password = self
            .required("password", &config.password, &config.password_ref, namespace)
            .await?;

        let otp_seed = if !config.otp_key.is_empty() {
            config.otp_key.clone()
        } else if config.otp_key_ref.is_configured() {
            self.lookup(&config.otp_key_ref, namespace).await?
        } else {
            String::new()
        };

        debug!(
            namespace = namespace,
            second_factor = !otp_seed.is_empty(),
            "resolved credentials"
        );

        Ok(Credentials::new(username, password).with_otp_seed(otp_seed))
    }

    async fn required(
        &self,
        field: &'static str,
        inline: &str,
        reference: &SecretRef,
        namespace: &str,
    ) -> Result<String> {
        if !inline.is_empty() {
            return Ok(inline.to_string());
        }
        if !reference.is_configured() {
            return Err(SolverError::MissingCredential { field });
        }
        self.lookup(reference, namespace).await
    }

    async fn lookup(&self, reference: &SecretRef, namespace: &str) -> Result<String> {
        let secret = self
            .store
            .get(namespace, &reference.name)
            .await
            .map_err(|e| {
                error!(
                    namespace = namespace,
                    secret = %reference.name,
                    error = %e,
                    "failed to load secret"
                );
                SolverError::SecretLookup {
                    namespace: namespace.to_string(),
                    name: reference.name.clone(),
                    reason: match e {
                        SecretStoreError::NotFound => "not found".to_string(),
                        SecretStoreError::Backend(msg) => msg,
                    },
                }
            })?;

        let value = secret
            .get(&reference.key)
            .ok_or_else(|| SolverError::SecretKeyMissing {
                namespace: namespace.to_string(),
                name: reference.name.clone(),
                key: reference.key.clone(),
            })?;

        String::from_utf8(value.clone()).map_err(|_| {
            error!(
                namespace = namespace,
                secret = %reference.name,
                key = %reference.key,
                "secret value is not valid UTF-8"
            );
            SolverError::SecretLookup {
                namespace: namespace.to_string(),
                name: reference.name.clone(),
                reason: format!("key \"{}\" is not valid UTF-8", reference.key),
            }
        })
    }
}
