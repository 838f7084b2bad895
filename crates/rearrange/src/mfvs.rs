//! Feedback vertex sets for one strongly connected component.
//!
//! Formulation
//! - One binary variable per node: 1 keeps the node in place, 0 moves it to
//!   the feedback set.
//! - Every directed cycle needs at least one feedback node, so the kept
//!   variables of a cycle sum to at most its length minus one. Cycle rows
//!   are added lazily: solve, look for cycles among the kept nodes, add the
//!   violated rows, re-solve. This avoids enumerating all simple cycles,
//!   which grows exponentially on dense components.
//! - Every layer edge `u -> v` adds `kept(u) >= kept(v)`: a node whose layer
//!   duplicate stays unresolved cannot itself be resolved.
//! - The objective maximizes kept nodes over the layer-independent ones —
//!   nodes with at least one non-layer blocking edge. With no layer edges
//!   every component node qualifies, which is exactly the single-layer
//!   "maximize all kept" objective.

use petgraph::graphmap::DiGraphMap;
use petgraph::Direction::{Incoming, Outgoing};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::PlanError;
use crate::graph::{find_cycles, induced_subgraph, is_acyclic, EdgeTag, ObjectId};
use crate::ilp::{BinaryProgram, IlpBackend, SolveCfg, SolveError, VarId};

/// Limits for one feedback-vertex-set solve.
#[derive(Clone, Copy, Debug)]
pub struct MfvsCfg {
    pub solve: SolveCfg,
    /// Cutting-plane iterations before the solve is declared over budget.
    pub max_cut_rounds: usize,
}

impl Default for MfvsCfg {
    fn default() -> Self {
        Self {
            solve: SolveCfg::default(),
            max_cut_rounds: 64,
        }
    }
}

/// Result of one component's cycle-breaking.
#[derive(Clone, Debug)]
pub struct Mfvs {
    /// Feedback nodes, in ascending id order.
    pub removed: Vec<ObjectId>,
    /// Nodes with at least one non-layer blocking edge in the component.
    pub layer_independent: BTreeSet<ObjectId>,
    /// Cutting-plane rounds the solve needed.
    pub cut_rounds: usize,
}

/// Nodes whose full in- or out-degree strictly exceeds their degree in the
/// layer-edge-only subgraph.
pub fn classify_layer_independent(sub: &DiGraphMap<ObjectId, EdgeTag>) -> BTreeSet<ObjectId> {
    let mut independent = BTreeSet::new();
    for v in sub.nodes() {
        let out_full = sub.neighbors_directed(v, Outgoing).count();
        let in_full = sub.neighbors_directed(v, Incoming).count();
        let out_layer = sub
            .neighbors_directed(v, Outgoing)
            .filter(|&w| sub.edge_weight(v, w).is_some_and(|t| t.is_layer()))
            .count();
        let in_layer = sub
            .neighbors_directed(v, Incoming)
            .filter(|&w| sub.edge_weight(w, v).is_some_and(|t| t.is_layer()))
            .count();
        if out_full > out_layer || in_full > in_layer {
            independent.insert(v);
        }
    }
    independent
}

/// Compute an optimal feedback vertex set for one component subgraph.
pub fn solve_mfvs(
    sub: &DiGraphMap<ObjectId, EdgeTag>,
    backend: &dyn IlpBackend,
    cfg: &MfvsCfg,
) -> Result<Mfvs, PlanError> {
    let mut nodes: Vec<ObjectId> = sub.nodes().collect();
    nodes.sort_unstable();
    let var_of: BTreeMap<ObjectId, VarId> = nodes
        .iter()
        .enumerate()
        .map(|(i, &n)| (n, VarId(i)))
        .collect();

    let layer_independent = classify_layer_independent(sub);
    let mut program = BinaryProgram::with_vars(nodes.len());
    for v in &layer_independent {
        program.set_objective(var_of[v], 1);
    }
    for (u, v, tag) in sub.all_edges() {
        if tag.is_layer() {
            program.add_dominates(var_of[&u], var_of[&v]);
        }
    }

    let mut rounds = 0usize;
    loop {
        let assignment = backend.solve(&program, &cfg.solve).map_err(|e| match e {
            SolveError::Infeasible => PlanError::InfeasibleModel,
            SolveError::TimedOut => PlanError::SolverTimeout,
        })?;
        let kept: Vec<ObjectId> = nodes
            .iter()
            .copied()
            .filter(|n| assignment.values[var_of[n].0])
            .collect();
        let cycles = find_cycles(&induced_subgraph(sub, &kept));
        if cycles.is_empty() {
            let removed: Vec<ObjectId> = nodes
                .iter()
                .copied()
                .filter(|n| !assignment.values[var_of[n].0])
                .collect();
            tracing::debug!(
                component = nodes.len(),
                removed = removed.len(),
                rounds,
                "feedback vertex set found"
            );
            return Ok(Mfvs {
                removed,
                layer_independent,
                cut_rounds: rounds,
            });
        }
        for cycle in &cycles {
            let vars: Vec<VarId> = cycle.iter().map(|n| var_of[n]).collect();
            program.add_at_most(&vars, cycle.len() as i64 - 1);
        }
        rounds += 1;
        if rounds >= cfg.max_cut_rounds {
            return Err(PlanError::SolverTimeout);
        }
    }
}

/// Exhaustive alternative: try node subsets by increasing size and return
/// the first whose removal is acyclic and respects every layer edge
/// (removing `u` forces removing its duplicate `v`). Exponential, but exact
/// on the set size; used to cross-check the optimization and as the
/// small-component fallback after a timeout.
pub fn exhaustive_mfvs(sub: &DiGraphMap<ObjectId, EdgeTag>) -> Vec<ObjectId> {
    let mut nodes: Vec<ObjectId> = sub.nodes().collect();
    nodes.sort_unstable();
    let layer_edges: Vec<(ObjectId, ObjectId)> = sub
        .all_edges()
        .filter(|(_, _, tag)| tag.is_layer())
        .map(|(u, v, _)| (u, v))
        .collect();

    for size in 0..=nodes.len() {
        let mut idx: Vec<usize> = (0..size).collect();
        loop {
            let removed: BTreeSet<ObjectId> = idx.iter().map(|&i| nodes[i]).collect();
            let layer_ok = layer_edges
                .iter()
                .all(|(u, v)| !removed.contains(u) || removed.contains(v));
            if layer_ok {
                let remaining: Vec<ObjectId> = nodes
                    .iter()
                    .copied()
                    .filter(|n| !removed.contains(n))
                    .collect();
                if is_acyclic(&induced_subgraph(sub, &remaining)) {
                    return removed.into_iter().collect();
                }
            }
            if !next_combination(&mut idx, nodes.len()) {
                break;
            }
        }
    }
    nodes
}

fn next_combination(idx: &mut [usize], n: usize) -> bool {
    let k = idx.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if idx[i] != i + n - k {
            idx[i] += 1;
            for j in i + 1..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
