//! Core traits for the DNS-01 solver
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: List zones and records, create and delete records
//! - [`SecretStore`]: Resolve credential bytes from a secret reference
//! - [`Solver`]: A named Present/CleanUp implementation served by the webhook

pub mod dns_provider;
pub mod secret_store;
pub mod solver;

pub use dns_provider::{DnsProvider, DnsProviderFactory, NewRecord, Record, RecordType, Zone};
pub use secret_store::SecretStore;
pub use solver::{Solver, StopSignal};
