//! 0/1 integer programs and the pluggable solver seam.
//!
//! The engine formulates feedback-vertex-set instances as binary programs
//! and hands them to an `IlpBackend`. The trait is deliberately narrow —
//! program in, optimal assignment out — so any conforming integer-program
//! solver can be plugged in without touching engine logic. `BnbBackend` is
//! the in-repo exact implementation.

pub mod bnb;
pub mod model;

pub use bnb::BnbBackend;
pub use model::{Assignment, BinaryProgram, LinearRow, VarId};

use std::time::Duration;
use thiserror::Error;

/// Backend failure modes.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SolveError {
    #[error("no feasible assignment satisfies the constraints")]
    Infeasible,
    #[error("time budget exhausted before proving optimality")]
    TimedOut,
}

/// Solve-time limits imposed by the caller. Integer programming is NP-hard,
/// so an unbounded solve is the caller's explicit choice.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolveCfg {
    pub time_limit: Option<Duration>,
}

/// A 0/1 linear-program solver. Must return an optimum, not merely a
/// feasible point.
pub trait IlpBackend {
    fn solve(&self, program: &BinaryProgram, cfg: &SolveCfg) -> Result<Assignment, SolveError>;
}
