// # DNS Provider Trait
//
// Capability interface over a DNS provider's record API.
//
// ## Implementations
//
// - LuaDNS: `dns01-provider-luadns` crate
// - In-memory: [`crate::provider::MemoryDnsProvider`] (tests, embedding)
//
// ## Usage
//
// ```rust,ignore
// use dns01_core::traits::{DnsProviderFactory, NewRecord};
//
// async fn publish(factory: &dyn DnsProviderFactory, api_key: &str) -> anyhow::Result<()> {
//     let session = factory.connect(api_key)?;
//     let zones = session.list_zones("example.com").await?;
//     let record = NewRecord::txt("_acme-challenge.example.com.", "token", 60);
//     session.create_record(&zones[0], record).await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;

use crate::error::ProviderError;

/// An authoritative zone as known to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider-assigned zone ID
    pub id: String,
    /// Zone name without a trailing dot (e.g. "example.com")
    pub name: String,
}

/// DNS record type
///
/// The solver only ever writes TXT records; other types are carried so that
/// listings can be represented faithfully and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// TXT record
    Txt,
    /// Any other record type, by its wire name
    Other(String),
}

impl RecordType {
    /// Parse a wire name such as "TXT" or "A"
    pub fn from_wire(name: &str) -> Self {
        if name.eq_ignore_ascii_case("TXT") {
            Self::Txt
        } else {
            Self::Other(name.to_string())
        }
    }

    /// Wire name of this type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Txt => "TXT",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource record as stored at the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Provider-assigned record ID
    pub id: String,
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified record name, dot-terminated
    pub name: String,
    /// Record value
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

/// A record to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    /// Record type
    pub record_type: RecordType,
    /// Fully-qualified record name, dot-terminated
    pub name: String,
    /// Record value
    pub content: String,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl NewRecord {
    /// Build a TXT record
    pub fn txt(name: impl Into<String>, content: impl Into<String>, ttl: u32) -> Self {
        Self {
            record_type: RecordType::Txt,
            name: name.into(),
            content: content.into(),
            ttl,
        }
    }
}

/// An authenticated session against a DNS provider
///
/// A session is built per challenge call by a [`DnsProviderFactory`] and dropped
/// when the call returns.
///
/// # Contract
///
/// - Each method performs a single remote call and returns its outcome
/// - No retry, backoff or caching; the caller owns those decisions
/// - Search queries are passed through as-is. Providers may return partial
///   matches and callers must filter for exact names
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Search zones by name
    ///
    /// The provider's search is fuzzy: the result may contain zones whose
    /// names merely contain `query`.
    async fn list_zones(&self, query: &str) -> Result<Vec<Zone>, ProviderError>;

    /// Search records of a zone by name
    async fn list_records(&self, zone: &Zone, query: &str) -> Result<Vec<Record>, ProviderError>;

    /// Create a record in a zone and return it as stored
    async fn create_record(&self, zone: &Zone, record: NewRecord) -> Result<Record, ProviderError>;

    /// Delete one record by its provider-assigned ID
    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<(), ProviderError>;

    /// Provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Builds provider sessions from a resolved API key
pub trait DnsProviderFactory: Send + Sync {
    /// Create a new session authenticated with `api_key`
    fn connect(&self, api_key: &str) -> Result<Box<dyn DnsProvider>, ProviderError>;
}
