//! Total action-order assembly.
//!
//! Components are processed in the condensation order from `graph::scc`,
//! each on a private induced copy. Within a component the feedback nodes
//! come out first (ordered so layer duplicates precede their base objects),
//! then the acyclic remainder in reverse topological order, then the
//! feedback nodes' final goal placements. An edge `u -> v` means `v` must
//! relocate before `u`, and a topological order puts `u` first, hence the
//! reversal everywhere.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::BTreeSet;

use crate::error::PlanError;
use crate::graph::{condense, induced_subgraph, DepGraph, EdgeTag, ObjectId};
use crate::ilp::{BnbBackend, IlpBackend, SolveCfg};
use crate::mfvs::{classify_layer_independent, exhaustive_mfvs, solve_mfvs, Mfvs, MfvsCfg};

/// Placement kind of one action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Temporary relocation that breaks a cycle; a matching `Goal` follows.
    Buffer,
    /// Final placement at the object's goal position.
    Goal,
}

/// One step of the output sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Action {
    pub node: ObjectId,
    pub placement: Placement,
}

impl Action {
    pub fn buffer(node: ObjectId) -> Self {
        Self {
            node,
            placement: Placement::Buffer,
        }
    }

    pub fn goal(node: ObjectId) -> Self {
        Self {
            node,
            placement: Placement::Goal,
        }
    }
}

/// Where the final goal placements of buffered feedback nodes go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnPolicy {
    /// Right after their component's remainder.
    ComponentEnd,
    /// Deferred to the very end of the whole sequence.
    SequenceEnd,
}

/// Assembly configuration.
#[derive(Clone, Copy, Debug)]
pub struct SequenceCfg {
    pub return_policy: ReturnPolicy,
    pub solve: SolveCfg,
    /// Cutting-plane iterations per component before giving up.
    pub max_cut_rounds: usize,
    /// Largest component the exhaustive search may take over after a solver
    /// timeout. Larger components propagate the timeout instead.
    pub exhaustive_limit: usize,
}

impl Default for SequenceCfg {
    fn default() -> Self {
        Self {
            return_policy: ReturnPolicy::ComponentEnd,
            solve: SolveCfg::default(),
            max_cut_rounds: 64,
            exhaustive_limit: 12,
        }
    }
}

/// The assembled sequence.
#[derive(Clone, Debug)]
pub struct SequencePlan {
    pub actions: Vec<Action>,
    /// Total feedback nodes across all components.
    pub feedback_total: usize,
    /// True when any component fell back to the exhaustive search, so the
    /// feedback sets are valid but not necessarily objective-optimal.
    pub degraded: bool,
}

/// Sequence a dependency graph with the given backend and configuration.
pub fn optimal_sequence(
    dg: &DepGraph,
    backend: &dyn IlpBackend,
    cfg: &SequenceCfg,
) -> Result<SequencePlan, PlanError> {
    let condensation = condense(&dg.graph);
    let mfvs_cfg = MfvsCfg {
        solve: cfg.solve,
        max_cut_rounds: cfg.max_cut_rounds,
    };
    let mut actions: Vec<Action> = Vec::with_capacity(dg.node_count());
    let mut deferred: Vec<Action> = Vec::new();
    let mut feedback_total = 0usize;
    let mut degraded = false;

    for component in &condensation.components {
        if component.len() == 1 {
            actions.push(Action::goal(component[0]));
            continue;
        }
        tracing::debug!(size = component.len(), "resolving strongly connected component");
        let mut sub = induced_subgraph(&dg.graph, component);
        let mfvs = match solve_mfvs(&sub, backend, &mfvs_cfg) {
            Ok(m) => m,
            Err(PlanError::SolverTimeout) if component.len() <= cfg.exhaustive_limit => {
                tracing::warn!(
                    size = component.len(),
                    "solver budget exhausted, falling back to exhaustive search"
                );
                degraded = true;
                Mfvs {
                    removed: exhaustive_mfvs(&sub),
                    layer_independent: classify_layer_independent(&sub),
                    cut_rounds: cfg.max_cut_rounds,
                }
            }
            Err(e) => return Err(e),
        };
        feedback_total += mfvs.removed.len();

        let mut returns: Vec<Action> = Vec::new();
        for v in feedback_order(&sub, &mfvs.removed)? {
            if mfvs.layer_independent.contains(&v) {
                actions.push(Action::buffer(v));
                returns.push(Action::goal(v));
            } else {
                // A pure layer duplicate is bookkeeping: the physical object
                // moves once, so it gets a single goal action here.
                actions.push(Action::goal(v));
            }
            sub.remove_node(v);
        }

        // Removal of the feedback set leaves the remainder acyclic; a cycle
        // here means the solver broke its contract.
        let mut order = toposort(&sub, None).map_err(|_| PlanError::InfeasibleModel)?;
        order.reverse();
        actions.extend(order.into_iter().map(Action::goal));

        match cfg.return_policy {
            ReturnPolicy::ComponentEnd => actions.append(&mut returns),
            ReturnPolicy::SequenceEnd => deferred.append(&mut returns),
        }
    }

    actions.extend(deferred);
    tracing::info!(
        actions = actions.len(),
        feedback_total,
        degraded,
        "sequence assembled"
    );
    Ok(SequencePlan {
        actions,
        feedback_total,
        degraded,
    })
}

/// Sequence with the in-repo exact backend and default configuration.
pub fn sequence_with_defaults(dg: &DepGraph) -> Result<SequencePlan, PlanError> {
    optimal_sequence(dg, &BnbBackend, &SequenceCfg::default())
}

/// Feedback nodes in reverse topological order of their layer-only
/// subgraph, so every duplicate is relocated before its base object.
fn feedback_order(
    sub: &DiGraphMap<ObjectId, EdgeTag>,
    removed: &[ObjectId],
) -> Result<Vec<ObjectId>, PlanError> {
    let set: BTreeSet<ObjectId> = removed.iter().copied().collect();
    let mut layer_sub: DiGraphMap<ObjectId, ()> = DiGraphMap::new();
    for &v in removed {
        layer_sub.add_node(v);
    }
    for (u, v, tag) in sub.all_edges() {
        if tag.is_layer() && set.contains(&u) && set.contains(&v) {
            layer_sub.add_edge(u, v, ());
        }
    }
    // Layer edges point strictly upward through the layers, so this
    // subgraph is acyclic for well-formed inputs.
    let mut order = toposort(&layer_sub, None).map_err(|_| PlanError::InfeasibleModel)?;
    order.reverse();
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petgraph::graphmap::DiGraphMap;
    use proptest::prelude::*;

    fn dep_graph(blocking: &[(usize, usize)], layer: &[(usize, usize)]) -> DepGraph {
        let mut g = DiGraphMap::new();
        for &(u, v) in blocking {
            g.add_edge(ObjectId(u), ObjectId(v), EdgeTag::Blocking);
        }
        let mut layer_pairs = Vec::new();
        for &(u, v) in layer {
            g.add_edge(ObjectId(u), ObjectId(v), EdgeTag::Layer);
            layer_pairs.push((ObjectId(u), ObjectId(v)));
        }
        let layers = if layer.is_empty() { 1 } else { 2 };
        DepGraph {
            graph: g,
            layer_pairs,
            layers,
        }
    }

    fn goal_position(plan: &SequencePlan, node: usize) -> usize {
        plan.actions
            .iter()
            .position(|a| a.node == ObjectId(node) && a.placement == Placement::Goal)
            .unwrap()
    }

    fn goal_count(plan: &SequencePlan, node: usize) -> usize {
        plan.actions
            .iter()
            .filter(|a| a.node == ObjectId(node) && a.placement == Placement::Goal)
            .count()
    }

    fn buffer_count(plan: &SequencePlan, node: usize) -> usize {
        plan.actions
            .iter()
            .filter(|a| a.node == ObjectId(node) && a.placement == Placement::Buffer)
            .count()
    }

    #[test]
    fn acyclic_graph_is_a_reverse_topological_order() {
        // Layer edges 2 -> 1 and 3 -> 4, blocking edges 1 -> 0 and 2 -> 3.
        let dg = dep_graph(&[(1, 0), (2, 3)], &[(2, 1), (3, 4)]);
        let plan = sequence_with_defaults(&dg).unwrap();
        assert_eq!(plan.actions.len(), 5);
        assert_eq!(plan.feedback_total, 0);
        assert!(plan
            .actions
            .iter()
            .all(|a| a.placement == Placement::Goal));
        assert!(goal_position(&plan, 0) < goal_position(&plan, 1));
        assert!(goal_position(&plan, 1) < goal_position(&plan, 2));
        assert!(goal_position(&plan, 4) < goal_position(&plan, 3));
    }

    #[test]
    fn triangle_cycle_buffers_exactly_one_node() {
        let dg = dep_graph(&[(0, 1), (1, 2), (2, 0)], &[]);
        let plan = sequence_with_defaults(&dg).unwrap();
        assert_eq!(plan.feedback_total, 1);
        assert_eq!(plan.actions.len(), 4);
        let buffers: Vec<ObjectId> = plan
            .actions
            .iter()
            .filter(|a| a.placement == Placement::Buffer)
            .map(|a| a.node)
            .collect();
        assert_eq!(buffers.len(), 1);
        let buffered = buffers[0].0;
        for n in 0..3 {
            assert_eq!(goal_count(&plan, n), 1);
        }
        // The buffer strictly precedes its own goal.
        let buffer_pos = plan
            .actions
            .iter()
            .position(|a| a.placement == Placement::Buffer)
            .unwrap();
        assert!(buffer_pos < goal_position(&plan, buffered));
        // The surviving edge is honored reversed: with node v removed, the
        // edge u -> w that remains demands w's goal before u's.
        let (u, w) = match buffered {
            0 => (1, 2),
            1 => (2, 0),
            _ => (0, 1),
        };
        assert!(goal_position(&plan, w) < goal_position(&plan, u));
    }

    #[test]
    fn layer_artifact_feedback_node_skips_the_buffer() {
        // Layer chain 0 -> 1 -> 2 -> 3 with blocking returns 1 -> 0 and
        // 3 -> 0 forms one component whose optimum removes {1, 2, 3}; node 2
        // touches only layer edges, so it must emit a single goal action.
        let dg = dep_graph(&[(1, 0), (3, 0)], &[(0, 1), (1, 2), (2, 3)]);
        assert!(dg.is_duplicate(ObjectId(2)));
        assert!(!dg.is_duplicate(ObjectId(0)));
        let plan = sequence_with_defaults(&dg).unwrap();
        assert_eq!(plan.feedback_total, 3);
        for n in 0..4 {
            assert_eq!(goal_count(&plan, n), 1);
        }
        assert_eq!(buffer_count(&plan, 2), 0);
        assert_eq!(buffer_count(&plan, 1), 1);
        assert_eq!(buffer_count(&plan, 3), 1);
        // Duplicates relocate before their base objects: 3 before 2 before 1.
        let first_move = |n: usize| {
            plan.actions
                .iter()
                .position(|a| a.node == ObjectId(n))
                .unwrap()
        };
        assert!(first_move(3) < first_move(2));
        assert!(first_move(2) < first_move(1));
    }

    #[test]
    fn sequence_end_policy_defers_all_returns() {
        // A cycle feeding a singleton: with SequenceEnd the buffered node's
        // goal lands after the singleton's.
        let dg = dep_graph(&[(0, 1), (1, 2), (2, 0), (3, 0)], &[]);
        let cfg = SequenceCfg {
            return_policy: ReturnPolicy::SequenceEnd,
            ..SequenceCfg::default()
        };
        let plan = optimal_sequence(&dg, &BnbBackend, &cfg).unwrap();
        let buffered = plan
            .actions
            .iter()
            .find(|a| a.placement == Placement::Buffer)
            .unwrap()
            .node;
        assert_eq!(
            plan.actions.last().unwrap(),
            &Action::goal(buffered),
            "buffered node's return must close the sequence"
        );
    }

    #[test]
    fn repeated_runs_agree() {
        let dg = dep_graph(&[(0, 1), (1, 2), (2, 0), (2, 3), (3, 2), (4, 0)], &[]);
        let a = sequence_with_defaults(&dg).unwrap();
        let b = sequence_with_defaults(&dg).unwrap();
        assert_eq!(a.actions, b.actions);
        assert_eq!(a.feedback_total, b.feedback_total);
    }

    #[test]
    fn cross_component_edges_are_respected() {
        // Cycle {0, 1} blocks on singleton 2; 2's goal must come first.
        let dg = dep_graph(&[(0, 1), (1, 0), (0, 2)], &[]);
        let plan = sequence_with_defaults(&dg).unwrap();
        assert!(goal_position(&plan, 2) < goal_position(&plan, 0));
        assert!(goal_position(&plan, 2) < goal_position(&plan, 1));
    }

    proptest! {
        // Blocking-only graphs: every node gets exactly one goal, feedback
        // nodes buffer strictly before their goal, and every edge between
        // two non-feedback nodes is honored reversed.
        #[test]
        fn output_invariants_hold(edges in proptest::collection::vec((0usize..7, 0usize..7), 0..24)) {
            let mut g = DiGraphMap::new();
            for n in 0..7 {
                g.add_node(ObjectId(n));
            }
            for (u, v) in edges {
                if u != v {
                    g.add_edge(ObjectId(u), ObjectId(v), EdgeTag::Blocking);
                }
            }
            let dg = DepGraph { graph: g.clone(), layer_pairs: Vec::new(), layers: 1 };
            let plan = sequence_with_defaults(&dg).unwrap();

            let mut buffered = BTreeSet::new();
            for n in 0..7 {
                let goals = plan.actions.iter().filter(|a| a.node == ObjectId(n) && a.placement == Placement::Goal).count();
                prop_assert_eq!(goals, 1);
                let buffers: Vec<usize> = plan.actions.iter().enumerate()
                    .filter(|(_, a)| a.node == ObjectId(n) && a.placement == Placement::Buffer)
                    .map(|(i, _)| i)
                    .collect();
                prop_assert!(buffers.len() <= 1);
                if let Some(&b) = buffers.first() {
                    buffered.insert(ObjectId(n));
                    let goal = plan.actions.iter().position(|a| a.node == ObjectId(n) && a.placement == Placement::Goal).unwrap();
                    prop_assert!(b < goal);
                }
            }
            prop_assert_eq!(buffered.len(), plan.feedback_total);
            for (u, v, _) in g.all_edges() {
                if !buffered.contains(&u) && !buffered.contains(&v) {
                    let pu = plan.actions.iter().position(|a| a.node == u && a.placement == Placement::Goal).unwrap();
                    let pv = plan.actions.iter().position(|a| a.node == v && a.placement == Placement::Goal).unwrap();
                    prop_assert!(pv < pu);
                }
            }
        }
    }
}
