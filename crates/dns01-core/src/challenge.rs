//! Challenge request types
//!
//! Field names follow the cert-manager `acme.cert-manager.io/v1alpha1`
//! webhook API so a request can be decoded straight off the wire.

use serde::{Deserialize, Serialize};

/// What the host wants done with a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeAction {
    /// Publish the TXT record
    Present,
    /// Remove the TXT record
    CleanUp,
}

/// A single DNS-01 challenge, supplied fresh for every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    /// Host-assigned identifier echoed back in the response
    #[serde(default)]
    pub uid: String,

    /// Requested action
    pub action: ChallengeAction,

    /// Challenge type, always "dns-01" for this solver
    #[serde(rename = "type", default)]
    pub challenge_type: String,

    /// Domain being validated (e.g. "example.com" or "*.example.com")
    #[serde(default)]
    pub dns_name: String,

    /// Expected TXT record value
    pub key: String,

    /// Namespace used to resolve secret references
    #[serde(default)]
    pub resource_namespace: String,

    /// Exact name the TXT record is published under, dot-terminated
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,

    /// Zone the record lives in, possibly dot-terminated
    pub resolved_zone: String,

    /// Whether ambient credentials may be used
    #[serde(default)]
    pub allow_ambient_credentials: bool,

    /// Opaque per-issuer solver configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl ChallengeRequest {
    /// Create a request with the fields the reconciler needs
    pub fn new(
        action: ChallengeAction,
        resolved_zone: impl Into<String>,
        resolved_fqdn: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            uid: String::new(),
            action,
            challenge_type: "dns-01".to_string(),
            dns_name: String::new(),
            key: key.into(),
            resource_namespace: String::new(),
            resolved_fqdn: resolved_fqdn.into(),
            resolved_zone: resolved_zone.into(),
            allow_ambient_credentials: false,
            config: None,
        }
    }

    /// Set the namespace used for secret lookup
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.resource_namespace = namespace.into();
        self
    }

    /// Set the solver configuration blob
    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = Some(config);
        self
    }

    /// Same request with a different action
    pub fn with_action(mut self, action: ChallengeAction) -> Self {
        self.action = action;
        self
    }

    /// Resolved zone with any trailing dot removed
    pub fn zone_name(&self) -> &str {
        self.resolved_zone.strip_suffix('.').unwrap_or(&self.resolved_zone)
    }
}
