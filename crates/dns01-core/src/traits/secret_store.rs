// # Secret Store Trait
//
// Resolves raw credential bytes from a `(namespace, name, key)` reference.
//
// ## Implementations
//
// - Kubernetes API: `dns01-secret-kube` crate
// - Mounted files: [`crate::secrets::FileSecretStore`]
// - In-memory: [`crate::secrets::MemorySecretStore`]

use async_trait::async_trait;

use crate::error::SecretError;

/// Trait for credential store implementations
///
/// Implementations must distinguish a missing secret, a missing key within an
/// existing secret, and a refused access. The reconciler reports these
/// verbatim so the operator can tell a typo from an RBAC problem.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch the value stored under `key` in secret `name` of `namespace`
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, SecretError>;

    /// Store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
