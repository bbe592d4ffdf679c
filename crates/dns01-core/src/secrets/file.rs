// # File Secret Store
//
// Reads secrets mounted into the filesystem.
//
// ## Layout
//
// ```text
// <root>/
//   <namespace>/
//     <secret name>/
//       <key>          # raw value, one file per key
// ```
//
// This matches what a projected or `secret` volume produces when each secret
// is mounted at `<root>/<namespace>/<name>`.
//
// ## Failure Mapping
//
// - `<root>/<namespace>/<name>` missing → `SecretNotFound`
// - key file missing inside an existing secret → `KeyNotFound`
// - permission denied on either → `AccessDenied`
// - empty or path-like components (`/`, `..`) → `InvalidReference`

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::SecretError;
use crate::traits::SecretStore;

/// File-backed secret store
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    root: PathBuf,
}

impl FileSecretStore {
    /// Create a store rooted at `root`
    ///
    /// The directory is not required to exist yet; lookups against a missing
    /// root report `SecretNotFound`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate_component(kind: &str, value: &str) -> Result<(), SecretError> {
        if value.is_empty() {
            return Err(SecretError::InvalidReference(format!("{} is empty", kind)));
        }
        if value == "." || value == ".." || value.contains('/') || value.contains('\\') {
            return Err(SecretError::InvalidReference(format!(
                "{} {:?} is not a plain name",
                kind, value
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, SecretError> {
        Self::validate_component("namespace", namespace)?;
        Self::validate_component("secret name", name)?;
        Self::validate_component("key", key)?;

        let denied = |e: std::io::Error| SecretError::AccessDenied {
            namespace: namespace.to_string(),
            name: name.to_string(),
            reason: e.to_string(),
        };

        let secret_dir = self.root.join(namespace).join(name);
        match fs::metadata(&secret_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(SecretError::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SecretError::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                });
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => return Err(denied(e)),
            Err(e) => return Err(SecretError::Backend(e.to_string())),
        }

        match fs::read(secret_dir.join(key)).await {
            Ok(value) => Ok(value),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SecretError::KeyNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
                key: key.to_string(),
            }),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => Err(denied(e)),
            Err(e) => Err(SecretError::Backend(e.to_string())),
        }
    }

    fn store_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_store_reads_key() {
        let dir = tempdir().unwrap();
        let secret_dir = dir.path().join("cert-manager").join("luadns");
        std::fs::create_dir_all(&secret_dir).unwrap();
        std::fs::write(secret_dir.join("api-key"), b"s3cr3t").unwrap();

        let store = FileSecretStore::new(dir.path());
        let value = store.get("cert-manager", "luadns", "api-key").await.unwrap();
        assert_eq!(value, b"s3cr3t");
    }

    #[tokio::test]
    async fn test_file_store_missing_secret_and_key() {
        let dir = tempdir().unwrap();
        let secret_dir = dir.path().join("default").join("luadns");
        std::fs::create_dir_all(&secret_dir).unwrap();
        std::fs::write(secret_dir.join("api-key"), b"x").unwrap();

        let store = FileSecretStore::new(dir.path());
        assert!(matches!(
            store.get("default", "other", "api-key").await,
            Err(SecretError::SecretNotFound { .. })
        ));
        assert!(matches!(
            store.get("default", "luadns", "token").await,
            Err(SecretError::KeyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_store_missing_root() {
        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path().join("does-not-exist"));
        assert!(matches!(
            store.get("default", "luadns", "api-key").await,
            Err(SecretError::SecretNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_components() {
        let dir = tempdir().unwrap();
        let store = FileSecretStore::new(dir.path());

        for (ns, name, key) in [
            ("default", "", "api-key"),
            ("..", "luadns", "api-key"),
            ("default", "a/b", "api-key"),
            ("default", "luadns", "../api-key"),
        ] {
            assert!(
                matches!(
                    store.get(ns, name, key).await,
                    Err(SecretError::InvalidReference(_))
                ),
                "expected invalid reference for {}/{}/{}",
                ns,
                name,
                key
            );
        }
    }
}
