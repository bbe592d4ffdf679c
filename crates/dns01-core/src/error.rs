//! Error types for the DNS-01 solver
//!
//! Every failure a Present/CleanUp call can report carries the stage it
//! happened in. Provider and secret failures are kept as the `source` so the
//! original cause is still reachable through [`std::error::Error::source`].

use thiserror::Error;

/// Result type alias for solver operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS-01 solver
#[derive(Error, Debug)]
pub enum Error {
    /// The per-request solver configuration could not be decoded
    #[error("error decoding solver config: {0}")]
    Config(String),

    /// Credential lookup failed
    #[error("unable to get credentials: {0}")]
    Secret(#[from] SecretError),

    /// A provider session could not be built from the resolved credentials
    #[error("unable to get client: {0}")]
    Session(#[source] ProviderError),

    /// The zone search itself failed
    #[error("unable to get zones for {zone}: {source}")]
    ZoneLookup {
        /// Zone that was searched for
        zone: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// No provider zone matches the requested zone exactly
    #[error("unable to find zone {zone}")]
    ZoneNotFound {
        /// Zone that was searched for
        zone: String,
    },

    /// Listing the records of a zone failed
    #[error("unable to get records from zone={zone}: {source}")]
    RecordList {
        /// Zone whose records were listed
        zone: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// Creating the challenge record failed
    #[error("unable to create record {fqdn}: {source}")]
    RecordCreate {
        /// Name of the record being created
        fqdn: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// Deleting the challenge record failed
    #[error("unable to delete record {record_id}: {source}")]
    RecordDelete {
        /// Provider-assigned ID of the record being deleted
        record_id: String,
        /// Underlying provider failure
        #[source]
        source: ProviderError,
    },

    /// The solver was asked to serve a request before `initialize` ran
    #[error("solver {0} has not been initialized")]
    NotInitialized(String),

    /// No solver with this name is registered
    #[error("no solver registered with name {0}")]
    UnknownSolver(String),

    /// Startup or registration configuration is invalid
    #[error("configuration error: {0}")]
    Startup(String),

    /// Termination was requested before the solver finished starting
    #[error("shutdown requested during initialization")]
    Shutdown,
}

impl Error {
    /// Create a config decode error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a startup configuration error
    pub fn startup(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Whether this error means the zone is absent at the provider
    pub fn is_zone_not_found(&self) -> bool {
        matches!(self, Self::ZoneNotFound { .. })
    }
}

/// Failures reported by a DNS provider API client
///
/// The reconciler does not branch on these; they are surfaced as-is inside the
/// stage error that wraps them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The HTTP request could not be sent or the connection failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The provider rejected the credentials
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The provider is throttling requests
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The addressed zone or record does not exist at the provider
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider returned a 5xx
    #[error("Provider server error (transient): {0}")]
    Server(String),

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or summary
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Map a non-success HTTP status and body into a provider error
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::Authentication(format!(
                "Invalid API key or insufficient permissions. Status: {}",
                status
            )),
            404 => Self::NotFound(body),
            429 => Self::RateLimited(format!("Please retry later. Status: {}", status)),
            500..=599 => Self::Server(format!("{} - {}", status, body)),
            _ => Self::Api {
                status,
                message: body,
            },
        }
    }
}

/// Failures reported by a [`SecretStore`](crate::traits::SecretStore)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretError {
    /// The referenced secret does not exist
    #[error("unable to get secret `{namespace}/{name}`: not found")]
    SecretNotFound {
        /// Namespace searched
        namespace: String,
        /// Secret name
        name: String,
    },

    /// The secret exists but has no such key
    #[error("key {key:?} not found in secret \"{namespace}/{name}\"")]
    KeyNotFound {
        /// Namespace searched
        namespace: String,
        /// Secret name
        name: String,
        /// Missing key
        key: String,
    },

    /// The store refused access to the secret
    #[error("access denied to secret `{namespace}/{name}`: {reason}")]
    AccessDenied {
        /// Namespace searched
        namespace: String,
        /// Secret name
        name: String,
        /// Reason reported by the store
        reason: String,
    },

    /// The reference cannot name a secret at all
    #[error("invalid secret reference: {0}")]
    InvalidReference(String),

    /// The store itself failed
    #[error("secret store error: {0}")]
    Backend(String),
}
