//! Strongly connected components and their condensation order.
//!
//! The assembler needs components in an order consistent with the
//! condensation DAG: when component X has an edge into component Y, Y's
//! nodes must be emitted first (an edge `u -> v` means `v` relocates before
//! `u`). SCC enumeration order alone does not guarantee this, so the
//! condensation is built and toposorted explicitly.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use std::collections::BTreeMap;

use super::types::{EdgeTag, ObjectId};

/// Components of a dependency graph, in emission order.
#[derive(Clone, Debug)]
pub struct Condensation {
    /// Reverse topological order of the condensation DAG: every component
    /// precedes the components that depend on it. Nodes within a component
    /// are sorted by id for reproducibility.
    pub components: Vec<Vec<ObjectId>>,
}

/// Decompose into SCCs and order them by the condensation DAG.
pub fn condense(g: &DiGraphMap<ObjectId, EdgeTag>) -> Condensation {
    let mut sccs = tarjan_scc(g);
    let mut component_of: BTreeMap<ObjectId, usize> = BTreeMap::new();
    for (i, scc) in sccs.iter().enumerate() {
        for &v in scc {
            component_of.insert(v, i);
        }
    }

    let mut dag: DiGraphMap<usize, ()> = DiGraphMap::new();
    for i in 0..sccs.len() {
        dag.add_node(i);
    }
    for (u, v, _) in g.all_edges() {
        let (cu, cv) = (component_of[&u], component_of[&v]);
        if cu != cv {
            dag.add_edge(cu, cv, ());
        }
    }

    // The condensation of a digraph is acyclic by construction.
    let order = toposort(&dag, None).expect("condensation DAG has no cycles");
    let mut components = Vec::with_capacity(sccs.len());
    for idx in order.into_iter().rev() {
        let mut comp = std::mem::take(&mut sccs[idx]);
        comp.sort_unstable();
        components.push(comp);
    }
    Condensation { components }
}
