//! Per-request solver configuration
//!
//! Issuers set this under `spec.acme.solvers[].dns01.webhook.config`. It only
//! references where credentials live; it must never carry the credentials
//! themselves.

use serde::{Deserialize, Serialize};

/// Decoded solver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    /// Secret holding the LuaDNS API key
    #[serde(default)]
    pub api_key_secret_ref: SecretKeySelector,
}

/// Reference to a single key of a secret in the challenge's namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    /// Secret name
    #[serde(default, alias = "secretName")]
    pub name: String,

    /// Key within the secret
    #[serde(default)]
    pub key: String,
}

impl SecretKeySelector {
    /// Create a selector
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }
}

impl SolverConfig {
    /// Create a configuration pointing at `name`/`key`
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            api_key_secret_ref: SecretKeySelector::new(name, key),
        }
    }

    /// Encode as the JSON blob carried on a challenge request
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "apiKeySecretRef": {
                "name": self.api_key_secret_ref.name,
                "key": self.api_key_secret_ref.key,
            }
        })
    }
}

/// Decode the configuration blob of a challenge request
///
/// No configuration (absent or JSON `null`) is valid and yields the zero
/// value. The resulting empty secret reference fails later, at credential
/// lookup.
pub fn load_config(config: Option<&serde_json::Value>) -> Result<SolverConfig, crate::Error> {
    match config {
        None | Some(serde_json::Value::Null) => Ok(SolverConfig::default()),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|e| crate::Error::config(e.to_string())),
    }
}
