//! Test doubles and common utilities for solver contract tests
//!
//! The provider double is the crate's own [`MemoryDnsProvider`]; this module
//! wires it to a reconciler with credentials already in place.

#![allow(dead_code)]

use dns01_core::config::SolverConfig;
use dns01_core::traits::{NewRecord, Record, Zone};
use dns01_core::{ChallengeAction, ChallengeRequest, MemoryDnsProvider, MemorySecretStore};
use dns01_core::{RecordReconciler, SecretStore};
use std::sync::Arc;

pub const NAMESPACE: &str = "cert-manager";
pub const SECRET_NAME: &str = "luadns-credentials";
pub const SECRET_KEY: &str = "api-key";
pub const API_KEY: &str = "luadns-api-key-0123456789";

pub const ZONE: &str = "example.com.";
pub const FQDN: &str = "_acme-challenge.example.com.";

/// A reconciler wired to an in-memory provider and secret store
pub struct Harness {
    pub backend: MemoryDnsProvider,
    pub secrets: MemorySecretStore,
    pub solver: RecordReconciler,
}

impl Harness {
    /// Reconciler whose provider accepts only [`API_KEY`], stored where the
    /// default request config points
    pub async fn new() -> Self {
        let backend = MemoryDnsProvider::with_api_key(API_KEY);
        let secrets = MemorySecretStore::new();
        secrets
            .insert(NAMESPACE, SECRET_NAME, SECRET_KEY, API_KEY)
            .await;

        let store: Arc<dyn SecretStore> = Arc::new(secrets.clone());
        let solver = RecordReconciler::with_secrets(Arc::new(backend.clone()), store);

        Self {
            backend,
            secrets,
            solver,
        }
    }

    pub async fn zone(&self, name: &str) -> Zone {
        self.backend.add_zone(name).await
    }

    pub async fn txt(&self, zone: &Zone, name: &str, content: &str) -> Record {
        self.backend
            .add_record(zone, NewRecord::txt(name, content, 300))
            .await
    }
}

/// A Present request for `key` under the default zone and FQDN
pub fn present(key: &str) -> ChallengeRequest {
    request(ChallengeAction::Present, ZONE, FQDN, key)
}

/// A CleanUp request for `key` under the default zone and FQDN
pub fn clean_up(key: &str) -> ChallengeRequest {
    request(ChallengeAction::CleanUp, ZONE, FQDN, key)
}

/// A request pointing at the harness credentials
pub fn request(action: ChallengeAction, zone: &str, fqdn: &str, key: &str) -> ChallengeRequest {
    ChallengeRequest::new(action, zone, fqdn, key)
        .with_namespace(NAMESPACE)
        .with_config(SolverConfig::new(SECRET_NAME, SECRET_KEY).to_json())
}
