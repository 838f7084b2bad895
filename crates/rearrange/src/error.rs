//! Error taxonomy for the sequencing engine.
//!
//! `InvalidInstance` covers malformed geometry and layer inputs and is fatal
//! to the run. `InfeasibleModel` means the integer program rejected every
//! assignment, which a well-formed dependency graph cannot cause (the
//! all-removed assignment is always feasible); it is surfaced, never worked
//! around. `SolverTimeout` is recoverable: callers may retry with the
//! exhaustive search on small components.

use thiserror::Error;

/// Errors surfaced by instance construction, graph building, and sequencing.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Malformed geometry or layering input (non-positive radius, mismatched
    /// object-id sets, bad layer composition).
    #[error("invalid instance: {reason}")]
    InvalidInstance { reason: String },

    /// The 0/1 program has no feasible assignment. Indicates an internal
    /// invariant violation rather than a property of the input.
    #[error("integer program has no feasible assignment")]
    InfeasibleModel,

    /// The optimization backend (or the cutting-plane loop driving it)
    /// exhausted its budget before proving optimality.
    #[error("solver exceeded its time budget")]
    SolverTimeout,
}

impl PlanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInstance {
            reason: reason.into(),
        }
    }
}
