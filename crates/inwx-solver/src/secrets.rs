//! Secret store adapters.
//!
//! [`InMemorySecretStore`] backs tests and local runs. It can be filled from
//! Kubernetes `Secret` manifests, the same files an operator would apply to
//! the cluster next to the issuer.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use inwx_core::{SecretData, SecretStore, SecretStoreError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Namespaced secrets held in memory.
#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    secrets: RwLock<HashMap<(String, String), SecretData>>,
}

impl InMemorySecretStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a secret
    pub fn insert(&self, namespace: &str, name: &str, data: SecretData) {
        let mut secrets = self
            .secrets
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        secrets.insert((namespace.to_string(), name.to_string()), data);
    }

    /// Insert or replace a secret from UTF-8 key/value pairs
    pub fn insert_strings<'a>(
        &self,
        namespace: &str,
        name: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
            .collect();
        self.insert(namespace, name, data);
    }

    /// Number of secrets held
    #[must_use]
    pub fn len(&self) -> usize {
        self.secrets
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no secrets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build a store from multi-document YAML containing `Secret` manifests.
    ///
    /// Documents of other kinds are skipped. Manifests without
    /// `metadata.namespace` land in `default_namespace`.
    pub fn from_manifests(yaml: &str, default_namespace: &str) -> Result<Self, SecretStoreError> {
        let store = Self::new();
        store.load_manifests(yaml, default_namespace)?;
        Ok(store)
    }

    /// Read a manifest file with [`InMemorySecretStore::from_manifests`].
    pub fn from_manifest_file(
        path: &Path,
        default_namespace: &str,
    ) -> Result<Self, SecretStoreError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SecretStoreError::Backend(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_manifests(&content, default_namespace)
    }

    /// Add every `Secret` manifest in `yaml` to the store.
    pub fn load_manifests(
        &self,
        yaml: &str,
        default_namespace: &str,
    ) -> Result<usize, SecretStoreError> {
        let mut loaded = 0;

        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| SecretStoreError::Backend(format!("invalid manifest: {e}")))?;
            if value.get("kind").and_then(serde_yaml::Value::as_str) != Some("Secret") {
                continue;
            }

            let manifest: SecretManifest = serde_yaml::from_value(value)
                .map_err(|e| SecretStoreError::Backend(format!("invalid manifest: {e}")))?;

            let namespace = manifest
                .metadata
                .namespace
                .as_deref()
                .unwrap_or(default_namespace)
                .to_string();
            let name = manifest.metadata.name.clone();
            let data = manifest.into_data()?;

            debug!(
                namespace = %namespace,
                secret = %name,
                keys = data.len(),
                "loaded secret manifest"
            );
            self.insert(&namespace, &name, data);
            loaded += 1;
        }

        Ok(loaded)
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<SecretData, SecretStoreError> {
        let secrets = self
            .secrets
            .read()
            .map_err(|e| SecretStoreError::Backend(e.to_string()))?;
        secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or(SecretStoreError::NotFound)
    }
}

/// The subset of a Kubernetes `Secret` the store needs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretManifest {
    metadata: ManifestMetadata,
    #[serde(default)]
    data: HashMap<String, String>,
    #[serde(default)]
    string_data: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ManifestMetadata {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
}

impl SecretManifest {
    /// Decode `data` and overlay `stringData`, which wins on conflicts.
    fn into_data(self) -> Result<SecretData, SecretStoreError> {
        let mut out = SecretData::new();

        for (key, encoded) in self.data {
            let decoded = STANDARD.decode(encoded.trim()).map_err(|e| {
                SecretStoreError::Backend(format!(
                    "secret {}: key {key} is not valid base64: {e}",
                    self.metadata.name
                ))
            })?;
            out.insert(key, decoded);
        }

        for (key, value) in self.string_data {
            out.insert(key, value.into_bytes());
        }

        Ok(out)
    }
}
