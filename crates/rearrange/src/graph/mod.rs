//! Dependency graphs: construction, decomposition, cycle discovery.
//!
//! Purpose
//! - Derive the directed blocking graph from start/goal arrangements and a
//!   disc radius, with the optional multi-layer duplication scheme.
//! - Partition it into strongly connected components ordered by the
//!   condensation DAG, and discover directed cycles for the feedback-set
//!   solver's lazy constraints.

pub mod build;
pub mod cycles;
pub mod scc;
pub mod types;

pub use build::build_graph;
pub use cycles::{find_cycles, is_acyclic};
pub use scc::{condense, Condensation};
pub use types::{induced_subgraph, DepGraph, EdgeTag, ObjectId};
