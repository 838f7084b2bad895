//! Data types for the dependency graph.
//!
//! Kept small and explicit to make `build` and `scc` easy to read.

use petgraph::graphmap::DiGraphMap;

/// Identifier of a movable object. Base objects and their layer duplicates
/// share one contiguous id space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub usize);

/// Edge payload. `Blocking` encodes a spatial conflict (the target occupies
/// space the source's goal placement needs); `Layer` encodes strict
/// precedence between duplicated representations of one object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeTag {
    Blocking,
    Layer,
}

impl EdgeTag {
    pub fn is_layer(self) -> bool {
        matches!(self, EdgeTag::Layer)
    }
}

/// Directed dependency graph. An edge `u -> v` means object `v` must be
/// relocated before `u` can be placed at its goal.
#[derive(Clone, Debug)]
pub struct DepGraph {
    pub graph: DiGraphMap<ObjectId, EdgeTag>,
    /// `(lower, higher)` duplicate pairs, one per object per layer boundary.
    pub layer_pairs: Vec<(ObjectId, ObjectId)>,
    pub layers: usize,
}

impl DepGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// True when `node` is a higher-layer duplicate rather than a base
    /// object. Callers consuming an action sequence can use this to tell
    /// physical relocations from layer bookkeeping.
    pub fn is_duplicate(&self, node: ObjectId) -> bool {
        self.layer_pairs.iter().any(|&(_, higher)| higher == node)
    }
}

/// Private copy of the subgraph induced by `nodes`. Component resolution
/// mutates these copies, never the shared graph.
pub fn induced_subgraph(
    g: &DiGraphMap<ObjectId, EdgeTag>,
    nodes: &[ObjectId],
) -> DiGraphMap<ObjectId, EdgeTag> {
    let mut sub = DiGraphMap::new();
    for &v in nodes {
        sub.add_node(v);
    }
    for (u, v, &tag) in g.all_edges() {
        if sub.contains_node(u) && sub.contains_node(v) {
            sub.add_edge(u, v, tag);
        }
    }
    sub
}
