// # LuaDNS Provider
//
// This crate provides a LuaDNS implementation of the DNS-01 solver's
// `DnsProvider` capability trait, plus the factory that opens one API session
// per challenge call.
//
// ## Behavior
//
// - One HTTP request per trait call; no retries, no backoff, no caching
// - HTTP timeout configured (30 seconds)
// - HTTP status codes mapped to `ProviderError` variants (401/403, 404, 429, 5xx)
// - Integer LuaDNS IDs are carried as strings
//
// ## Security Requirements
//
// - The API key NEVER appears in logs or Debug output
// - An empty API key is rejected before any request is made
//
// ## API Reference
//
// - LuaDNS REST API v1: https://www.luadns.com/api.html
// - List Zones: GET `/zones?query=...`
// - List Records: GET `/zones/:zone_id/records?query=...`
// - Create Record: POST `/zones/:zone_id/records`
// - Delete Record: DELETE `/zones/:zone_id/records/:record_id`
//
// Requests authenticate with HTTP basic auth (account email, API key).

use async_trait::async_trait;
use dns01_core::error::ProviderError;
use dns01_core::traits::{DnsProvider, DnsProviderFactory, NewRecord, Record, RecordType, Zone};
use dns01_core::{RecordReconciler, SolverRegistry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// LuaDNS API base URL
pub const LUADNS_API_BASE: &str = "https://api.luadns.com/v1";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Zone as returned by the LuaDNS API
#[derive(Debug, Deserialize)]
struct ZoneResponse {
    id: u64,
    name: String,
}

impl From<ZoneResponse> for Zone {
    fn from(zone: ZoneResponse) -> Self {
        Zone {
            id: zone.id.to_string(),
            name: zone.name,
        }
    }
}

/// Record as returned by the LuaDNS API
#[derive(Debug, Deserialize)]
struct RecordResponse {
    id: u64,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    ttl: u32,
}

impl From<RecordResponse> for Record {
    fn from(record: RecordResponse) -> Self {
        Record {
            id: record.id.to_string(),
            record_type: RecordType::from_wire(&record.record_type),
            name: record.name,
            content: record.content,
            ttl: record.ttl,
        }
    }
}

/// Record creation payload
#[derive(Debug, Serialize)]
struct CreateRecordRequest<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    content: &'a str,
    ttl: u32,
}

/// LuaDNS API session
///
/// A session is bound to one API key and lives for a single Present/CleanUp
/// call. It borrows the factory's connection pool, so opening one is cheap.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API key.
pub struct LuaDnsClient {
    base_url: String,
    email: String,
    /// ⚠️ NEVER log this value
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for LuaDnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuaDnsClient")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl LuaDnsClient {
    /// Create a session with its own HTTP client
    ///
    /// # Errors
    ///
    /// Fails if `api_key` is empty or the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::with_client(build_http_client()?, base_url, email, api_key)
    }

    fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ProviderError::auth("LuaDNS API key cannot be empty"));
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            email: email.into(),
            api_key,
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Authenticate and send a request, turning non-2xx statuses into errors
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ProviderError> {
        let response = request
            .basic_auth(&self.email, Some(&self.api_key))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ProviderError::http(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        tracing::debug!("LuaDNS request failed with status {}", status);
        Err(ProviderError::from_status(status.as_u16(), error_text))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
        response
            .json()
            .await
            .map_err(|e| {
                ProviderError::invalid_response(format!("Failed to parse response: {}", e))
            })
    }
}

#[async_trait]
impl DnsProvider for LuaDnsClient {
    /// # API Call
    ///
    /// ```http
    /// GET /zones?query=example.com
    /// ```
    async fn list_zones(&self, query: &str) -> Result<Vec<Zone>, ProviderError> {
        tracing::debug!("Listing LuaDNS zones matching {}", query);

        let request = self.client.get(self.url("/zones")).query(&[("query", query)]);
        let zones: Vec<ZoneResponse> = Self::decode(self.send(request).await?).await?;

        Ok(zones.into_iter().map(Zone::from).collect())
    }

    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/records?query=_acme-challenge.example.com.
    /// ```
    async fn list_records(&self, zone: &Zone, query: &str) -> Result<Vec<Record>, ProviderError> {
        tracing::debug!("Listing LuaDNS records in zone {} matching {}", zone.id, query);

        let request = self
            .client
            .get(self.url(&format!("/zones/{}/records", zone.id)))
            .query(&[("query", query)]);
        let records: Vec<RecordResponse> = Self::decode(self.send(request).await?).await?;

        Ok(records.into_iter().map(Record::from).collect())
    }

    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/records
    /// {"name": "...", "type": "TXT", "content": "...", "ttl": 60}
    /// ```
    async fn create_record(&self, zone: &Zone, record: NewRecord) -> Result<Record, ProviderError> {
        tracing::debug!(
            "Creating LuaDNS {} record {} in zone {}",
            record.record_type,
            record.name,
            zone.id
        );

        let payload = CreateRecordRequest {
            name: &record.name,
            record_type: record.record_type.as_str(),
            content: &record.content,
            ttl: record.ttl,
        };
        let request = self
            .client
            .post(self.url(&format!("/zones/{}/records", zone.id)))
            .json(&payload);
        let created: RecordResponse = Self::decode(self.send(request).await?).await?;

        Ok(created.into())
    }

    /// # API Call
    ///
    /// ```http
    /// DELETE /zones/:zone_id/records/:record_id
    /// ```
    async fn delete_record(&self, zone: &Zone, record_id: &str) -> Result<(), ProviderError> {
        tracing::debug!("Deleting LuaDNS record {} in zone {}", record_id, zone.id);

        let request = self
            .client
            .delete(self.url(&format!("/zones/{}/records/{}", zone.id, record_id)));
        // The deleted record is echoed back; nothing in it is needed
        self.send(request).await?;

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "luadns"
    }
}

fn build_http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_TIMEOUT)
        .build()
        .map_err(|e| ProviderError::http(format!("Failed to build HTTP client: {}", e)))
}

/// Factory for per-call LuaDNS sessions
///
/// Holds the endpoint, the account email and a shared HTTP connection pool.
/// The API key is supplied per call by the reconciler.
#[derive(Debug, Clone)]
pub struct LuaDnsFactory {
    base_url: String,
    email: String,
    client: reqwest::Client,
}

impl LuaDnsFactory {
    /// Create a factory for the given API endpoint and account email
    pub fn new(
        base_url: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            base_url: base_url.into(),
            email: email.into(),
            client: build_http_client()?,
        })
    }

    /// Factory for the public LuaDNS API
    pub fn with_email(email: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new(LUADNS_API_BASE, email)
    }

    /// API endpoint sessions talk to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl DnsProviderFactory for LuaDnsFactory {
    fn connect(&self, api_key: &str) -> Result<Box<dyn DnsProvider>, ProviderError> {
        let session = LuaDnsClient::with_client(
            self.client.clone(),
            self.base_url.clone(),
            self.email.clone(),
            api_key,
        )?;
        Ok(Box::new(session))
    }
}

/// Register the LuaDNS solver with a registry
///
/// This function should be called during startup to serve challenges under
/// the `luadns` solver name.
///
/// # Example
///
/// ```rust
/// use dns01_core::SolverRegistry;
/// use dns01_provider_luadns::LuaDnsFactory;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut registry = SolverRegistry::new("acme.example.com")?;
/// dns01_provider_luadns::register(&mut registry, LuaDnsFactory::with_email("")?)?;
/// assert!(registry.has_solver("luadns"));
/// # Ok(())
/// # }
/// ```
pub fn register(registry: &mut SolverRegistry, factory: LuaDnsFactory) -> dns01_core::Result<()> {
    registry.register(Box::new(RecordReconciler::new(Arc::new(factory))))
}
