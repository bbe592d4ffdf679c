// # Memory DNS Provider
//
// In-memory implementation of DnsProvider and DnsProviderFactory.
//
// ## Purpose
//
// Stands in for a real provider API in tests and embedded use. It behaves like
// a hosted DNS API in the ways the reconciler cares about:
//
// - Zone and record searches are substring matches, not exact matches
// - IDs are assigned by the "provider"
// - Every session shares one backing record set
//
// It also counts calls and can be told to fail a given operation.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use crate::error::ProviderError;
use crate::traits::dns_provider::{DnsProvider, DnsProviderFactory, NewRecord, Record, Zone};

/// In-memory DNS provider
///
/// Cloning is cheap and every clone (and every session returned by
/// [`DnsProviderFactory::connect`]) sees the same zones and records.
///
/// # Example
///
/// ```rust
/// use dns01_core::provider::MemoryDnsProvider;
/// use dns01_core::traits::{DnsProvider, DnsProviderFactory, NewRecord};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let backend = MemoryDnsProvider::new();
///     let zone = backend.add_zone("example.com").await;
///
///     let session = backend.connect("api-key")?;
///     session
///         .create_record(&zone, NewRecord::txt("_acme-challenge.example.com.", "abc", 60))
///         .await?;
///
///     assert_eq!(backend.records(&zone).await.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDnsProvider {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    /// API key sessions must present, if any
    expected_api_key: Option<String>,
    state: RwLock<MemoryState>,
    connect_calls: AtomicUsize,
    list_zones_calls: AtomicUsize,
    list_records_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

#[derive(Debug, Default)]
struct MemoryState {
    zones: Vec<Zone>,
    /// Records paired with the ID of the zone they belong to
    records: Vec<(String, Record)>,
    next_id: u64,
    failures: Failures,
}

#[derive(Debug, Default)]
struct Failures {
    list_zones: Option<ProviderError>,
    list_records: Option<ProviderError>,
    create: Option<ProviderError>,
    delete: Option<ProviderError>,
}

impl MemoryDnsProvider {
    /// Create an empty provider accepting any API key
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty provider accepting only `api_key`
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                expected_api_key: Some(api_key.into()),
                ..Inner::default()
            }),
        }
    }

    fn next_id(state: &mut MemoryState, prefix: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", prefix, state.next_id)
    }

    /// Add a zone and return it
    pub async fn add_zone(&self, name: &str) -> Zone {
        let mut state = self.inner.state.write().await;
        let zone = Zone {
            id: Self::next_id(&mut state, "zone"),
            name: name.to_string(),
        };
        state.zones.push(zone.clone());
        zone
    }

    /// Insert a record directly, bypassing call counters
    pub async fn add_record(&self, zone: &Zone, record: NewRecord) -> Record {
        let mut state = self.inner.state.write().await;
        let record = Record {
            id: Self::next_id(&mut state, "record"),
            record_type: record.record_type,
            name: record.name,
            content: record.content,
            ttl: record.ttl,
        };
        state.records.push((zone.id.clone(), record.clone()));
        record
    }

    /// All records currently stored in `zone`
    pub async fn records(&self, zone: &Zone) -> Vec<Record> {
        let state = self.inner.state.read().await;
        state
            .records
            .iter()
            .filter(|(zone_id, _)| *zone_id == zone.id)
            .map(|(_, record)| record.clone())
            .collect()
    }

    /// Total number of records across all zones
    pub async fn record_count(&self) -> usize {
        self.inner.state.read().await.records.len()
    }

    /// Make every subsequent `list_zones` call fail
    pub async fn fail_list_zones(&self, error: ProviderError) {
        self.inner.state.write().await.failures.list_zones = Some(error);
    }

    /// Make every subsequent `list_records` call fail
    pub async fn fail_list_records(&self, error: ProviderError) {
        self.inner.state.write().await.failures.list_records = Some(error);
    }

    /// Make every subsequent `create_record` call fail
    pub async fn fail_create(&self, error: ProviderError) {
        self.inner.state.write().await.failures.create = Some(error);
    }

    /// Make every subsequent `delete_record` call fail
    pub async fn fail_delete(&self, error: ProviderError) {
        self.inner.state.write().await.failures.delete = Some(error);
    }

    /// Number of sessions opened
    pub fn connect_calls(&self) -> usize {
        self.inner.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_zones` calls
    pub fn list_zones_calls(&self) -> usize {
        self.inner.list_zones_calls.load(Ordering::SeqCst)
    }

    /// Number of `list_records` calls
    pub fn list_records_calls(&self) -> usize {
        self.inner.list_records_calls.load(Ordering::SeqCst)
    }

    /// Number of `create_record` calls
    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `delete_record` calls
    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of mutating calls (create + delete)
    pub fn mutation_calls(&self) -> usize {
        self.create_calls() + self.delete_calls()
    }
}

impl DnsProviderFactory for MemoryDnsProvider {
    fn connect(&self, api_key: &str) -> Result<Box<dyn DnsProvider>, ProviderError> {
        self.inner.connect_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(expected) = &self.inner.expected_api_key
            && expected != api_key
        {
            return Err(ProviderError::auth("API key rejected"));
        }

        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl DnsProvider for MemoryDnsProvider {
    async fn list_zones(&self, query: &str) -> Result<Vec<Zone>, ProviderError> {
        self.inner.list_zones_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.state.read().await;
        if let Some(error) = &state.failures.list_zones {
            return Err(error.clone());
        }

        Ok(state
            .zones
            .iter()
            .filter(|zone| zone.name.contains(query))
            .cloned()
            .collect())
    }

    async fn list_records(&self, zone: &Zone, query: &str) -> Result<Vec<Record>, ProviderError> {
        self.inner.list_records_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.inner.state.read().await;
        if let Some(error) = &state.failures.list_records {
            return Err(error.clone());
        }
        if !state.zones.iter().any(|z| z.id == zone.id) {
            return Err(ProviderError::NotFound(format!("zone {}", zone.id)));
        }

        Ok(state
            .records
            .iter()
            .filter(|(zone_id, record)| *zone_id == zone.id && record.name.contains(query))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn create_record(&self, zone: &Zone, record: NewRecord) -> Result<Record, ProviderError> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        {
            let state = self.inner.state.read().await;
            if let Some(error) = &state.failures.create {
                return Err(error.clone());
            }
            if !state.zones.iter().any(|z| z.id == zone.id) {
                return Err(ProviderError::NotFound(format!("zone {}", zone.id)));
            }
        }

        Ok(self.add_record(zone, record).await)
    }

    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<(), ProviderError> {
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.inner.state.write().await;
        if let Some(error) = &state.failures.delete {
            return Err(error.clone());
        }

        let before = state.records.len();
        state
            .records
            .retain(|(zone_id, record)| !(*zone_id == zone.id && record.id == record_id));

        if state.records.len() == before {
            return Err(ProviderError::NotFound(format!("record {}", record_id)));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
