// # dns01-core
//
// Core library for the DNS-01 challenge webhook solver.
//
// ## Architecture Overview
//
// This library owns the decision-making for ACME DNS-01 challenges:
// - **DnsProvider**: Capability trait over the provider's list/create/delete API
// - **SecretStore**: Trait for resolving provider credentials by reference
// - **Solver**: Trait a named solver implements to be served by the webhook
// - **RecordReconciler**: Present/CleanUp state transitions for one TXT record
// - **SolverRegistry**: Named solvers registered under a single API group
//
// ## Design Principles
//
// 1. **Stateless calls**: Every Present/CleanUp builds its own provider session
// 2. **Exact matching**: Zones and records are matched by exact name, never fuzzily
// 3. **Idempotency**: Repeated calls converge without further side effects
// 4. **Selectivity**: Only the record carrying this challenge's key is ever removed

pub mod challenge;
pub mod config;
pub mod error;
pub mod provider;
pub mod reconciler;
pub mod registry;
pub mod resolver;
pub mod secrets;
pub mod traits;

// Re-export core types for convenience
pub use challenge::{ChallengeAction, ChallengeRequest};
pub use config::{SecretKeySelector, SolverConfig};
pub use error::{Error, Result};
pub use provider::MemoryDnsProvider;
pub use reconciler::RecordReconciler;
pub use registry::SolverRegistry;
pub use secrets::{FileSecretStore, MemorySecretStore};
pub use traits::{DnsProvider, DnsProviderFactory, SecretStore, Solver, StopSignal};
