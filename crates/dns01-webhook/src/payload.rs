//! cert-manager webhook wire types
//!
//! cert-manager calls the webhook as an aggregated API server: it POSTs a
//! `ChallengePayload` carrying a request and expects the same kind back with
//! the response filled in.

use dns01_core::ChallengeRequest;
use serde::{Deserialize, Serialize};

/// API version of the challenge payload
pub const API_VERSION: &str = "acme.cert-manager.io/v1alpha1";

/// Kind of the challenge payload
pub const KIND: &str = "ChallengePayload";

/// Version segment of the webhook API path
pub const SOLVER_VERSION: &str = "v1alpha1";

/// Request/response envelope exchanged with cert-manager
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePayload {
    #[serde(default)]
    pub api_version: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<ChallengeRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ChallengeResponse>,
}

impl ChallengePayload {
    /// Wrap a request
    pub fn request(request: ChallengeRequest) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            request: Some(request),
            response: None,
        }
    }

    /// Wrap a response
    pub fn response(response: ChallengeResponse) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

/// Outcome of one Present/CleanUp call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResponse {
    /// UID of the request this answers
    pub uid: String,

    pub success: bool,

    /// Failure details, only set when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl ChallengeResponse {
    pub fn success(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            success: true,
            status: None,
        }
    }

    pub fn failure(uid: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            success: false,
            status: Some(Status {
                status: "Failure".to_string(),
                message: message.into(),
                reason: "InternalError".to_string(),
            }),
        }
    }
}

/// Subset of a Kubernetes `metav1.Status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub status: String,
    pub message: String,
    pub reason: String,
}

/// Discovery document for the webhook's API group version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResourceList {
    pub kind: String,
    pub api_version: String,
    pub group_version: String,
    pub resources: Vec<ApiResource>,
}

impl ApiResourceList {
    /// Discovery document listing one resource per solver name
    pub fn for_solvers(group_name: &str, solvers: &[String]) -> Self {
        Self {
            kind: "APIResourceList".to_string(),
            api_version: "v1".to_string(),
            group_version: format!("{}/{}", group_name, SOLVER_VERSION),
            resources: solvers
                .iter()
                .map(|name| ApiResource {
                    name: name.clone(),
                    singular_name: name.clone(),
                    namespaced: false,
                    kind: KIND.to_string(),
                    verbs: vec!["create".to_string()],
                })
                .collect(),
        }
    }
}

/// One resource in an [`ApiResourceList`]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    pub singular_name: String,
    pub namespaced: bool,
    pub kind: String,
    pub verbs: Vec<String>,
}
