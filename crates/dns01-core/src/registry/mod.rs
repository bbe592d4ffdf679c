//! Named solver registry
//!
//! The registry holds every solver served by one webhook deployment, all under
//! a single API group. Solvers are addressed by [`Solver::name`], which lets
//! several providers share one deployment without hardcoded dispatch.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dns01_core::{RecordReconciler, SolverRegistry};
//!
//! let mut registry = SolverRegistry::new("acme.example.com")?;
//! registry.register(Box::new(RecordReconciler::new(factory)))?;
//! registry.initialize(secrets, &stop)?;
//!
//! registry.dispatch("luadns", &request).await?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::challenge::{ChallengeAction, ChallengeRequest};
use crate::error::{Error, Result};
use crate::traits::{SecretStore, Solver, StopSignal};

/// Registry of named solvers under one API group
///
/// The group name is fixed at construction. Solvers are registered and
/// initialized while the registry is exclusively owned, then it is shared
/// read-only (typically inside an `Arc`) while serving.
pub struct SolverRegistry {
    group_name: String,
    solvers: HashMap<String, Box<dyn Solver>>,
}

impl SolverRegistry {
    /// Create an empty registry for `group_name`
    ///
    /// # Errors
    ///
    /// An empty group name is rejected: the webhook cannot be addressed
    /// without one.
    pub fn new(group_name: impl Into<String>) -> Result<Self> {
        let group_name = group_name.into();
        if group_name.trim().is_empty() {
            return Err(Error::startup("GROUP_NAME must be specified"));
        }

        Ok(Self {
            group_name,
            solvers: HashMap::new(),
        })
    }

    /// API group all solvers are served under
    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Register a solver under its own name
    ///
    /// # Errors
    ///
    /// Registering two solvers with the same name is a configuration error.
    pub fn register(&mut self, solver: Box<dyn Solver>) -> Result<()> {
        let name = solver.name().to_string();
        if self.solvers.contains_key(&name) {
            return Err(Error::startup(format!(
                "solver {} is already registered in group {}",
                name, self.group_name
            )));
        }

        info!("Registering solver {} in group {}", name, self.group_name);
        self.solvers.insert(name, solver);
        Ok(())
    }

    /// Initialize every registered solver
    ///
    /// Stops at the first solver that fails.
    pub fn initialize(&mut self, secrets: Arc<dyn SecretStore>, stop: &StopSignal) -> Result<()> {
        for (name, solver) in self.solvers.iter_mut() {
            debug!("Initializing solver {}", name);
            solver.initialize(Arc::clone(&secrets), stop)?;
        }
        Ok(())
    }

    /// Look up a solver by name
    pub fn get(&self, name: &str) -> Option<&dyn Solver> {
        self.solvers.get(name).map(|solver| solver.as_ref())
    }

    /// Route a challenge to the named solver according to its action
    pub async fn dispatch(&self, name: &str, request: &ChallengeRequest) -> Result<()> {
        let solver = self
            .get(name)
            .ok_or_else(|| Error::UnknownSolver(name.to_string()))?;

        match request.action {
            ChallengeAction::Present => solver.present(request).await,
            ChallengeAction::CleanUp => solver.clean_up(request).await,
        }
    }

    /// Names of all registered solvers, sorted
    pub fn list_solvers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.solvers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a solver is registered
    pub fn has_solver(&self, name: &str) -> bool {
        self.solvers.contains_key(name)
    }
}
