// # Solver Trait
//
// A named DNS-01 solver as seen by the webhook host.
//
// The host registers solvers by [`Solver::name`], calls
// [`Solver::initialize`] once before serving, and then routes each challenge
// to [`Solver::present`] or [`Solver::clean_up`].

use async_trait::async_trait;
use std::sync::Arc;

use crate::challenge::ChallengeRequest;
use crate::error::Result;
use crate::traits::SecretStore;

/// Termination signal handed to solvers at startup
///
/// The value flips to `true` once the process has been asked to stop.
pub type StopSignal = tokio::sync::watch::Receiver<bool>;

/// Trait for DNS-01 solver implementations
///
/// # Idempotency
///
/// Both `present` and `clean_up` may be called repeatedly with the same
/// request. Only the first successful call may have side effects.
///
/// # Concurrency
///
/// The host may call `present` and `clean_up` concurrently for different
/// challenges. Implementations must not rely on shared mutable state.
#[async_trait]
pub trait Solver: Send + Sync {
    /// Name used to address this solver within its API group
    ///
    /// Must be unique within one webhook deployment.
    fn name(&self) -> &'static str;

    /// Ensure the challenge TXT record exists
    async fn present(&self, request: &ChallengeRequest) -> Result<()>;

    /// Remove the challenge TXT record carrying this request's key
    ///
    /// If several TXT records share the name, only the one whose value equals
    /// the request key is removed.
    async fn clean_up(&self, request: &ChallengeRequest) -> Result<()>;

    /// Called once when the webhook starts, before any challenge is served
    ///
    /// `secrets` supplies credential connectivity. `stop` is observed only
    /// here: if termination was already requested, initialization fails.
    fn initialize(&mut self, secrets: Arc<dyn SecretStore>, stop: &StopSignal) -> Result<()>;
}
