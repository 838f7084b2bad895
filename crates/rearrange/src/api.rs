//! Curated re-export surface.
//!
//! Prefer these re-exports in experiment code and the CLI for consistency;
//! the module tree stays the source of truth.

pub use crate::error::PlanError;
// Dependency graphs
pub use crate::graph::{
    build_graph, condense, find_cycles, induced_subgraph, is_acyclic, Condensation, DepGraph,
    EdgeTag, ObjectId,
};
// 0/1 programs and backends
pub use crate::ilp::{
    Assignment, BinaryProgram, BnbBackend, IlpBackend, LinearRow, SolveCfg, SolveError, VarId,
};
// Instances
pub use crate::instance::{
    disc_radius, draw_instance, layer_composition, Arrangement, Instance, ReplayToken, SampleCfg,
};
// Feedback vertex sets
pub use crate::mfvs::{classify_layer_independent, exhaustive_mfvs, solve_mfvs, Mfvs, MfvsCfg};
// Sequencing
pub use crate::sequence::{
    optimal_sequence, sequence_with_defaults, Action, Placement, ReturnPolicy, SequenceCfg,
    SequencePlan,
};
