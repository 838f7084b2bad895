//! Sequencing engine for labeled disc rearrangement.
//!
//! Given start and goal arrangements of unit discs in a shared workspace,
//! some goal placements overlap other discs' current placements. Those
//! blocking relationships form a directed dependency graph whose cycles
//! cannot be resolved by ordering alone: a minimum set of discs must visit a
//! temporary buffer location first. This crate builds the dependency graph
//! (optionally with multi-layer precedence), decomposes it into strongly
//! connected components, computes a feedback vertex set per component via a
//! 0/1 integer program, and assembles a total action order.
//!
//! Pipeline: `graph::build` → `graph::scc` → `mfvs` (per component, on top of
//! `ilp`) → `sequence`.

pub mod api;
pub mod error;
pub mod graph;
pub mod ilp;
pub mod instance;
pub mod mfvs;
pub mod sequence;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::PlanError;
pub use nalgebra::Vector2 as Vec2;

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::error::PlanError;
    pub use crate::graph::{build_graph, DepGraph, EdgeTag, ObjectId};
    pub use crate::ilp::{BnbBackend, IlpBackend, SolveCfg};
    pub use crate::instance::{
        disc_radius, draw_instance, layer_composition, Arrangement, Instance, ReplayToken,
        SampleCfg,
    };
    pub use crate::sequence::{
        optimal_sequence, sequence_with_defaults, Action, Placement, ReturnPolicy, SequenceCfg,
        SequencePlan,
    };
    pub use nalgebra::Vector2 as Vec2;
}
