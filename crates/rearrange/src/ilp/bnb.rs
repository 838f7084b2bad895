//! Exact branch-and-bound backend for 0/1 programs.
//!
//! Depth-first search over variable assignments with an incumbent bound.
//! Branching is deterministic (lowest index first, value 1 before 0) and the
//! incumbent only replaces on strict improvement, so the first optimum found
//! under that order is the one returned. Two prunes apply at every node: the
//! optimistic objective bound (assigned value plus every positive unassigned
//! coefficient) and per-row feasibility (the smallest achievable left-hand
//! side already exceeds the right-hand side).

use std::time::Instant;

use super::model::{Assignment, BinaryProgram, VarId};
use super::{IlpBackend, SolveCfg, SolveError};

/// The in-repo exact solver. Suitable for the per-component programs this
/// engine produces; any external conforming solver can replace it behind
/// `IlpBackend`.
#[derive(Clone, Copy, Debug, Default)]
pub struct BnbBackend;

impl IlpBackend for BnbBackend {
    fn solve(&self, program: &BinaryProgram, cfg: &SolveCfg) -> Result<Assignment, SolveError> {
        let deadline = cfg.time_limit.map(|limit| Instant::now() + limit);
        let mut run = BnbRun {
            program,
            deadline,
            values: vec![None; program.num_vars()],
            best: None,
            nodes: 0,
        };
        run.search(0)?;
        tracing::trace!(nodes = run.nodes, "branch-and-bound finished");
        run.best.ok_or(SolveError::Infeasible)
    }
}

struct BnbRun<'a> {
    program: &'a BinaryProgram,
    deadline: Option<Instant>,
    values: Vec<Option<bool>>,
    best: Option<Assignment>,
    nodes: u64,
}

impl BnbRun<'_> {
    fn search(&mut self, depth: usize) -> Result<(), SolveError> {
        self.nodes += 1;
        if self.nodes % 64 == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Err(SolveError::TimedOut);
                }
            }
        }
        if !self.rows_satisfiable() {
            return Ok(());
        }
        if let Some(best) = &self.best {
            if self.optimistic_bound() <= best.objective {
                return Ok(());
            }
        }
        if depth == self.program.num_vars() {
            let values: Vec<bool> = self.values.iter().map(|v| *v == Some(true)).collect();
            let objective = self.program.objective_value(&values);
            let improves = self
                .best
                .as_ref()
                .map(|b| objective > b.objective)
                .unwrap_or(true);
            if improves {
                self.best = Some(Assignment { values, objective });
            }
            return Ok(());
        }
        for value in [true, false] {
            self.values[depth] = Some(value);
            self.search(depth + 1)?;
        }
        self.values[depth] = None;
        Ok(())
    }

    /// Objective achievable from here: assigned value plus every positive
    /// coefficient still undecided.
    fn optimistic_bound(&self) -> i64 {
        self.program
            .objective()
            .iter()
            .zip(&self.values)
            .map(|(&c, v)| match v {
                Some(true) => c,
                Some(false) => 0,
                None => c.max(0),
            })
            .sum()
    }

    /// Every row must still admit some completion: the smallest achievable
    /// left-hand side (undecided variables take whichever value helps) must
    /// not exceed the right-hand side.
    fn rows_satisfiable(&self) -> bool {
        self.program.rows().iter().all(|row| {
            let min_lhs: i64 = row
                .terms
                .iter()
                .map(|&(VarId(i), c)| match self.values[i] {
                    Some(true) => c,
                    Some(false) => 0,
                    None => c.min(0),
                })
                .sum();
            min_lhs <= row.rhs
        })
    }
}
