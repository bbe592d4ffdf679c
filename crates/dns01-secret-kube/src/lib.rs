// # Kubernetes Secret Store
//
// `SecretStore` implementation backed by the Kubernetes core/v1 Secret API.
//
// ## Access
//
// Inside a pod the store authenticates with the mounted service account:
//
// - API server: `https://$KUBERNETES_SERVICE_HOST:$KUBERNETES_SERVICE_PORT`
// - Bearer token: `<service account dir>/token`
// - Cluster CA: `<service account dir>/ca.crt` (optional)
//
// One GET is made per lookup. Nothing is cached, so rotated credentials are
// picked up by the next challenge.
//
// ## API Reference
//
// - Read Secret: GET `/api/v1/namespaces/:namespace/secrets/:name`
//
// Values under `data` are base64-encoded by the API server and decoded here.
// References that are not valid Kubernetes object names are rejected with
// `InvalidReference` before any request is made.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use dns01_core::error::SecretError;
use dns01_core::traits::SecretStore;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Where the kubelet mounts the pod's service account credentials
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Default HTTP timeout for API server requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// The part of a core/v1 Secret this store reads
#[derive(Debug, Deserialize)]
struct SecretResponse {
    #[serde(default)]
    data: HashMap<String, String>,
}

/// Secret store reading from the Kubernetes API server
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the bearer token.
pub struct KubeSecretStore {
    api_server: String,
    /// ⚠️ NEVER log this value
    token: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore")
            .field("api_server", &self.api_server)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl KubeSecretStore {
    /// Create a store for an explicit API server
    ///
    /// # Parameters
    ///
    /// - `api_server`: Base URL, e.g. `https://10.0.0.1:443`
    /// - `token`: Bearer token with `get` permission on the secrets
    /// - `ca_pem`: PEM bundle to trust for the API server, if not publicly signed
    pub fn new(
        api_server: impl Into<String>,
        token: impl Into<String>,
        ca_pem: Option<&[u8]>,
    ) -> Result<Self, SecretError> {
        let mut builder = reqwest::Client::builder().timeout(DEFAULT_HTTP_TIMEOUT);

        if let Some(pem) = ca_pem {
            let cert = reqwest::Certificate::from_pem(pem).map_err(|e| {
                SecretError::Backend(format!("Failed to parse CA certificate: {}", e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder
            .build()
            .map_err(|e| SecretError::Backend(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_server: api_server.into().trim_end_matches('/').to_string(),
            token: token.into().trim().to_string(),
            client,
        })
    }

    /// Create a store from a service account directory
    ///
    /// `token` is required; `ca.crt` is used when present.
    pub fn from_service_account(
        api_server: impl Into<String>,
        dir: impl AsRef<Path>,
    ) -> Result<Self, SecretError> {
        let dir = dir.as_ref();

        let token = std::fs::read_to_string(dir.join("token")).map_err(|e| {
            SecretError::Backend(format!(
                "Failed to read service account token from {}: {}",
                dir.display(),
                e
            ))
        })?;
        let ca = std::fs::read(dir.join("ca.crt")).ok();

        Self::new(api_server, token, ca.as_deref())
    }

    /// Create a store for the cluster this pod runs in
    ///
    /// # Errors
    ///
    /// Fails if `KUBERNETES_SERVICE_HOST` is unset or the service account
    /// token cannot be read.
    pub fn in_cluster() -> Result<Self, SecretError> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            SecretError::Backend(
                "KUBERNETES_SERVICE_HOST not set, not running in Kubernetes?".to_string(),
            )
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

        tracing::debug!("Using in-cluster API server {}:{}", host, port);
        Self::from_service_account(format!("https://{}:{}", host, port), SERVICE_ACCOUNT_DIR)
    }

    /// API server this store talks to
    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    /// Check a reference the way the API server names objects
    ///
    /// Namespaces are DNS-1123 labels, secret names DNS-1123 subdomains and
    /// data keys `[-._a-zA-Z0-9]+`. Anything else could rewrite the request
    /// path, so it is refused before a request is built.
    fn validate_reference(namespace: &str, name: &str, key: &str) -> Result<(), SecretError> {
        if namespace.is_empty() || name.is_empty() {
            return Err(SecretError::InvalidReference(format!(
                "secret reference \"{}/{}\" is incomplete",
                namespace, name
            )));
        }
        if !is_dns1123_label(namespace) {
            return Err(SecretError::InvalidReference(format!(
                "namespace {:?} is not a valid Kubernetes name",
                namespace
            )));
        }
        if !is_dns1123_subdomain(name) {
            return Err(SecretError::InvalidReference(format!(
                "secret name {:?} is not a valid Kubernetes name",
                name
            )));
        }
        if !is_config_key(key) {
            return Err(SecretError::InvalidReference(format!(
                "key {:?} is not a valid secret key",
                key
            )));
        }
        Ok(())
    }

    async fn fetch(&self, namespace: &str, name: &str) -> Result<SecretResponse, SecretError> {
        let url = format!(
            "{}/api/v1/namespaces/{}/secrets/{}",
            self.api_server, namespace, name
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| {
                SecretError::Backend(format!("Failed to connect to Kubernetes API: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                404 => SecretError::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                },
                401 | 403 => SecretError::AccessDenied {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                    reason: format!("Kubernetes API returned {}", status),
                },
                _ => SecretError::Backend(format!("Kubernetes API returned {}: {}", status, body)),
            });
        }

        response
            .json()
            .await
            .map_err(|e| SecretError::Backend(format!("Failed to parse Kubernetes secret: {}", e)))
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get(&self, namespace: &str, name: &str, key: &str) -> Result<Vec<u8>, SecretError> {
        Self::validate_reference(namespace, name, key)?;

        let secret = self.fetch(namespace, name).await?;

        let encoded = secret.data.get(key).ok_or_else(|| SecretError::KeyNotFound {
            namespace: namespace.to_string(),
            name: name.to_string(),
            key: key.to_string(),
        })?;

        STANDARD.decode(encoded).map_err(|e| {
            SecretError::Backend(format!(
                "key {:?} in secret \"{}/{}\" is not valid base64: {}",
                key, namespace, name, e
            ))
        })
    }

    fn store_name(&self) -> &'static str {
        "kubernetes"
    }
}

fn is_dns1123_label(value: &str) -> bool {
    let bytes = value.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 63
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes[0] != b'-'
        && bytes[bytes.len() - 1] != b'-'
}

fn is_dns1123_subdomain(value: &str) -> bool {
    value.len() <= 253 && value.split('.').all(is_dns1123_label)
}

fn is_config_key(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 253
        && value != "."
        && value != ".."
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}
