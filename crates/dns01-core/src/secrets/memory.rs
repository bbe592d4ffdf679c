// # Memory Secret Store
//
// In-memory implementation of SecretStore.
//
// Useful for tests and for embedding the solver where credentials are already
// at hand. Secrets are keyed by `(namespace, name)` and hold a map of keys to
// raw bytes, mirroring the shape of a Kubernetes Secret.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::SecretError;
use crate::traits::SecretStore;

type SecretData = HashMap<String, Vec<u8>>;

/// In-memory secret store implementation
///
/// # Example
///
/// ```rust,no_run
/// use dns01_core::secrets::MemorySecretStore;
/// use dns01_core::traits::SecretStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemorySecretStore::new();
///     store.insert("cert-manager", "luadns", "api-key", "s3cr3t").await;
///
///     let value = store.get("cert-manager", "luadns", "api-key").await?;
///     assert_eq!(value, b"s3cr3t");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    secrets: Arc<RwLock<HashMap<(String, String), SecretData>>>,
    /// Secrets that exist but may not be read
    denied: Arc<RwLock<HashSet<(String, String)>>>,
}

impl MemorySecretStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` of secret `namespace/name`, creating the secret if needed
    pub async fn insert(
        &self,
        namespace: &str,
        name: &str,
        key: &str,
        value: impl Into<Vec<u8>>,
    ) {
        let mut guard = self.secrets.write().await;
        guard
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.into());
    }

    /// Remove a whole secret
    pub async fn remove(&self, namespace: &str, name: &str) {
        let mut guard = self.secrets.write().await;
        guard.remove(&(namespace.to_string(), name.to_string()));
    }

    /// Refuse every read of secret `namespace/name`
    pub async fn deny(&self, namespace: &str, name: &str) {
        let mut guard = self.denied.write().await;
        guard.insert((namespace.to_string(), name.to_string()));
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, SecretError> {
        let id = (namespace.to_string(), name.to_string());

        if self.denied.read().await.contains(&id) {
            return Err(SecretError::AccessDenied {
                namespace: namespace.to_string(),
                name: name.to_string(),
                reason: "forbidden".to_string(),
            });
        }

        let guard = self.secrets.read().await;
        let data = guard.get(&id).ok_or_else(|| SecretError::SecretNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
        })?;

        data.get(key).cloned().ok_or_else(|| SecretError::KeyNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}
