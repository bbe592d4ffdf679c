//! Challenge record reconciliation
//!
//! The RecordReconciler is responsible for:
//! - Resolving the provider credentials a challenge refers to
//! - Locating the challenge's zone and any record already carrying its key
//! - Creating the TXT record on Present when it is missing
//! - Deleting exactly that record on CleanUp when it is present
//!
//! ## Flow
//!
//! ```text
//! ChallengeRequest
//!        │
//!        ▼
//! ┌──────────────┐   config → secret ref   ┌─────────────┐
//! │  locate()    │────────────────────────▶│ SecretStore │
//! │              │◀──────── api key ───────└─────────────┘
//! │              │
//! │              │── connect(api key) ──▶ DnsProviderFactory ──▶ session
//! │              │── find_zone(session, zone)
//! │              │── list_records(zone, fqdn)
//! └──────────────┘
//!        │  (session, zone, Option<matching record>)
//!        ▼
//!  present:  None → create_record     Some → no-op
//!  clean_up: Some → delete_record(id) None → no-op
//! ```
//!
//! ## State Machine
//!
//! Per challenge: `Absent → Present → Present* → Absent → Absent*`. Calling
//! CleanUp before Present is the `Absent → Absent` no-op.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::challenge::ChallengeRequest;
use crate::config::{SolverConfig, load_config};
use crate::error::{Error, Result, SecretError};
use crate::resolver::find_zone;
use crate::traits::{
    DnsProvider, DnsProviderFactory, NewRecord, Record, RecordType, SecretStore, Solver,
    StopSignal, Zone,
};

/// TTL of the challenge TXT records this solver creates
pub const CHALLENGE_TTL: u32 = 60;

/// Name the LuaDNS-backed solver is registered under
pub const DEFAULT_SOLVER_NAME: &str = "luadns";

/// Outcome of a locate pass
///
/// Owns the per-call provider session; dropping it ends the session.
pub struct Located {
    /// Session used for this call
    pub session: Box<dyn DnsProvider>,
    /// Zone whose name equals the request's resolved zone
    pub zone: Zone,
    /// Record matching type, name and content, if any
    pub record: Option<Record>,
}

/// Present/CleanUp implementation for one DNS provider
///
/// Holds only immutable collaborators; no state is kept between calls.
///
/// ## Lifecycle
///
/// 1. Create with [`RecordReconciler::new()`]
/// 2. [`Solver::initialize()`] supplies the secret store
/// 3. Serve [`Solver::present()`] / [`Solver::clean_up()`] calls
pub struct RecordReconciler {
    name: &'static str,
    factory: Arc<dyn DnsProviderFactory>,
    secrets: Option<Arc<dyn SecretStore>>,
}

impl RecordReconciler {
    /// Create a reconciler named [`DEFAULT_SOLVER_NAME`]
    pub fn new(factory: Arc<dyn DnsProviderFactory>) -> Self {
        Self::with_name(DEFAULT_SOLVER_NAME, factory)
    }

    /// Create a reconciler with an explicit solver name
    pub fn with_name(name: &'static str, factory: Arc<dyn DnsProviderFactory>) -> Self {
        Self {
            name,
            factory,
            secrets: None,
        }
    }

    /// Create an already-initialized reconciler
    pub fn with_secrets(
        factory: Arc<dyn DnsProviderFactory>,
        secrets: Arc<dyn SecretStore>,
    ) -> Self {
        Self {
            name: DEFAULT_SOLVER_NAME,
            factory,
            secrets: Some(secrets),
        }
    }

    fn secrets(&self) -> Result<&Arc<dyn SecretStore>> {
        self.secrets
            .as_ref()
            .ok_or_else(|| Error::NotInitialized(self.name.to_string()))
    }

    /// Resolve the API key and open a provider session
    async fn connect(
        &self,
        cfg: &SolverConfig,
        namespace: &str,
    ) -> Result<Box<dyn DnsProvider>> {
        let selector = &cfg.api_key_secret_ref;
        info!("Try to load secret {}.{}", selector.name, selector.key);

        let raw = self
            .secrets()?
            .get(namespace, &selector.name, &selector.key)
            .await?;

        let api_key = String::from_utf8(raw).map_err(|_| {
            SecretError::Backend(format!(
                "key {:?} in secret \"{}/{}\" is not valid UTF-8",
                selector.key, namespace, selector.name
            ))
        })?;

        self.factory.connect(&api_key).map_err(Error::Session)
    }

    /// Find the session, zone and matching record for a challenge
    ///
    /// A record matches only if its type is TXT, its name equals
    /// `resolved_fqdn` and its content equals `key`. Records that share the
    /// name but carry another value are skipped, never touched.
    pub async fn locate(&self, request: &ChallengeRequest) -> Result<Located> {
        let cfg = load_config(request.config.as_ref())?;
        let domain = request.zone_name();

        let session = self.connect(&cfg, &request.resource_namespace).await?;

        let zone = find_zone(session.as_ref(), domain)
            .await?
            .ok_or_else(|| Error::ZoneNotFound {
                zone: domain.to_string(),
            })?;

        info!("Looking for fqdn {}", request.resolved_fqdn);
        let records = session
            .list_records(&zone, &request.resolved_fqdn)
            .await
            .map_err(|source| Error::RecordList {
                zone: zone.name.clone(),
                source,
            })?;

        let mut matching = None;
        for record in records {
            if is_challenge_record(&record, request) {
                info!(
                    "Found existing record type={} name={} content={} zone={}",
                    record.record_type, record.name, record.content, zone.name
                );
                matching = Some(record);
                break;
            }
            info!(
                "Ignoring record type={} name={} content={} zone={}",
                record.record_type, record.name, record.content, zone.name
            );
        }

        Ok(Located {
            session,
            zone,
            record: matching,
        })
    }
}

/// Whether `record` is the TXT record this challenge publishes
fn is_challenge_record(record: &Record, request: &ChallengeRequest) -> bool {
    record.record_type == RecordType::Txt
        && record.name == request.resolved_fqdn
        && record.content == request.key
}

#[async_trait]
impl Solver for RecordReconciler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn present(&self, request: &ChallengeRequest) -> Result<()> {
        info!("Present for fqdn {}", request.resolved_fqdn);

        let located = self.locate(request).await?;
        if let Some(existing) = located.record {
            info!("Record already exists {}", existing.name);
            return Ok(());
        }

        let record = NewRecord::txt(&request.resolved_fqdn, &request.key, CHALLENGE_TTL);
        info!("Creating new record {}", record.name);
        located
            .session
            .create_record(&located.zone, record)
            .await
            .map_err(|source| Error::RecordCreate {
                fqdn: request.resolved_fqdn.clone(),
                source,
            })?;

        Ok(())
    }

    async fn clean_up(&self, request: &ChallengeRequest) -> Result<()> {
        info!("Cleanup for fqdn {}", request.resolved_fqdn);

        let located = self.locate(request).await?;
        let Some(existing) = located.record else {
            info!("No existing record to clean up for fqdn {}", request.resolved_fqdn);
            return Ok(());
        };

        info!("Deleting record {} (id {})", existing.name, existing.id);
        located
            .session
            .delete_record(&located.zone, &existing.id)
            .await
            .map_err(|source| Error::RecordDelete {
                record_id: existing.id.clone(),
                source,
            })?;

        Ok(())
    }

    fn initialize(&mut self, secrets: Arc<dyn SecretStore>, stop: &StopSignal) -> Result<()> {
        if *stop.borrow() {
            return Err(Error::Shutdown);
        }

        info!(
            "Initialized solver {} with {} secret store",
            self.name,
            secrets.store_name()
        );
        self.secrets = Some(secrets);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::ChallengeAction;
    use crate::provider::MemoryDnsProvider;
    use crate::secrets::MemorySecretStore;

    fn request(key: &str) -> ChallengeRequest {
        ChallengeRequest::new(
            ChallengeAction::Present,
            "example.com.",
            "_acme-challenge.example.com.",
            key,
        )
        .with_namespace("default")
        .with_config(SolverConfig::new("luadns", "api-key").to_json())
    }

    async fn reconciler(backend: &MemoryDnsProvider) -> RecordReconciler {
        let secrets = MemorySecretStore::new();
        secrets.insert("default", "luadns", "api-key", "secret-key").await;
        RecordReconciler::with_secrets(Arc::new(backend.clone()), Arc::new(secrets))
    }

    #[test]
    fn test_challenge_record_predicate() {
        let req = request("abc");
        let mut record = Record {
            id: "1".to_string(),
            record_type: RecordType::Txt,
            name: "_acme-challenge.example.com.".to_string(),
            content: "abc".to_string(),
            ttl: 60,
        };
        assert!(is_challenge_record(&record, &req));

        record.content = "other".to_string();
        assert!(!is_challenge_record(&record, &req));

        record.content = "abc".to_string();
        record.record_type = RecordType::Other("CNAME".to_string());
        assert!(!is_challenge_record(&record, &req));

        record.record_type = RecordType::Txt;
        record.name = "_acme-challenge.example.com".to_string();
        assert!(!is_challenge_record(&record, &req));
    }

    #[tokio::test]
    async fn test_locate_finds_matching_record() {
        let backend = MemoryDnsProvider::new();
        let zone = backend.add_zone("example.com").await;
        backend
            .add_record(&zone, NewRecord::txt("_acme-challenge.example.com.", "other", 60))
            .await;
        let expected = backend
            .add_record(&zone, NewRecord::txt("_acme-challenge.example.com.", "abc", 60))
            .await;

        let located = reconciler(&backend).await.locate(&request("abc")).await.unwrap();
        assert_eq!(located.zone, zone);
        assert_eq!(located.record, Some(expected));
    }

    #[tokio::test]
    async fn test_present_uses_sixty_second_ttl() {
        let backend = MemoryDnsProvider::new();
        let zone = backend.add_zone("example.com").await;

        reconciler(&backend).await.present(&request("abc")).await.unwrap();

        let records = backend.records(&zone).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ttl, CHALLENGE_TTL);
        assert_eq!(records[0].record_type, RecordType::Txt);
    }

    #[tokio::test]
    async fn test_uninitialized_solver_refuses_requests() {
        let backend = MemoryDnsProvider::new();
        backend.add_zone("example.com").await;
        let solver = RecordReconciler::new(Arc::new(backend.clone()));

        let err = solver.present(&request("abc")).await.unwrap_err();
        assert!(matches!(err, Error::NotInitialized(_)));
        assert_eq!(backend.connect_calls(), 0);
    }

    #[tokio::test]
    async fn test_initialize_observes_stop_signal() {
        let backend = MemoryDnsProvider::new();
        let secrets: Arc<dyn SecretStore> = Arc::new(MemorySecretStore::new());

        let (tx, rx) = tokio::sync::watch::channel(false);
        let mut solver = RecordReconciler::new(Arc::new(backend.clone()));
        solver.initialize(secrets.clone(), &rx).unwrap();

        tx.send(true).unwrap();
        let mut late = RecordReconciler::new(Arc::new(backend));
        assert!(matches!(
            late.initialize(secrets, &rx),
            Err(Error::Shutdown)
        ));
    }

    #[tokio::test]
    async fn test_non_utf8_api_key_is_a_secret_error() {
        let backend = MemoryDnsProvider::new();
        backend.add_zone("example.com").await;
        let secrets = MemorySecretStore::new();
        secrets
            .insert("default", "luadns", "api-key", vec![0xff, 0xfe])
            .await;
        let solver = RecordReconciler::with_secrets(Arc::new(backend.clone()), Arc::new(secrets));

        let err = solver.present(&request("abc")).await.unwrap_err();
        assert!(matches!(err, Error::Secret(SecretError::Backend(_))));
        assert_eq!(backend.connect_calls(), 0);
    }
}
