//! Dependency-graph construction from start/goal arrangements.

use petgraph::graphmap::DiGraphMap;

use crate::error::PlanError;
use crate::instance::Arrangement;

use super::types::{DepGraph, EdgeTag, ObjectId};

/// Build the dependency graph for `layer_sizes.len()` layers.
///
/// `layer_sizes` is a composition of the object count into positive,
/// non-increasing parts (see `instance::layer_composition`); `[n]` selects
/// the single-layer variant. For multi-layer instances the id space is
/// partitioned into contiguous blocks, and each higher-block id becomes a
/// duplicate of the corresponding id one block below: its start coordinate
/// is overwritten in place and a `Layer` edge `lower -> higher` records that
/// the higher layer must be relocated first.
///
/// Blocking edges `g -> s` exist iff the discs at `goal[g]` and `start[s]`
/// overlap, i.e. their centers are within two radii. No self-loops.
pub fn build_graph(
    start: &mut Arrangement,
    goal: &Arrangement,
    radius: f64,
    layer_sizes: &[usize],
) -> Result<DepGraph, PlanError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(PlanError::invalid(format!(
            "disc radius must be positive and finite, got {radius}"
        )));
    }
    if !start.keys().eq(goal.keys()) {
        return Err(PlanError::invalid(
            "start and goal arrangements must cover the same object ids",
        ));
    }
    let n = start.len();
    if n == 0 {
        return Err(PlanError::invalid("instance needs at least one object"));
    }
    check_composition(layer_sizes, n)?;

    // Duplicate layer blocks bottom-up. Each block reuses the start
    // coordinates of the block below it, so a goal placement that conflicts
    // with the base object also conflicts with every duplicate above it.
    let layers = layer_sizes.len();
    let mut layer_pairs: Vec<(ObjectId, ObjectId)> = Vec::new();
    if layers > 1 {
        if start.keys().enumerate().any(|(i, id)| id.0 != i) {
            return Err(PlanError::invalid(
                "multi-layer instances need contiguous object ids starting at zero",
            ));
        }
        let mut base = 0usize;
        let mut curr = layer_sizes[0];
        for &size in &layer_sizes[1..] {
            for i in 0..size {
                let lower = ObjectId(base + i);
                let higher = ObjectId(curr + i);
                let coord = *start
                    .get(&lower)
                    .ok_or_else(|| PlanError::invalid("layer block exceeds the one below it"))?;
                start.insert(higher, coord);
                layer_pairs.push((lower, higher));
            }
            base = curr;
            curr += size;
        }
    }

    let mut graph = DiGraphMap::new();
    for &id in goal.keys() {
        graph.add_node(id);
    }
    let reach = 2.0 * radius;
    for (&g, gc) in goal {
        for (&s, sc) in start.iter() {
            if g == s {
                continue;
            }
            if (sc - gc).norm() <= reach {
                graph.add_edge(g, s, EdgeTag::Blocking);
            }
        }
    }
    // Layer precedence overrides a coincident blocking edge: the duplicate
    // shares its base coordinate, so the spatial test often fires too.
    for &(lower, higher) in &layer_pairs {
        graph.add_edge(lower, higher, EdgeTag::Layer);
    }

    tracing::debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        layers,
        "dependency graph built"
    );
    Ok(DepGraph {
        graph,
        layer_pairs,
        layers,
    })
}

fn check_composition(layer_sizes: &[usize], total: usize) -> Result<(), PlanError> {
    if layer_sizes.is_empty() {
        return Err(PlanError::invalid("layer composition must not be empty"));
    }
    if layer_sizes.len() > 1 && layer_sizes.len() >= total {
        return Err(PlanError::invalid(format!(
            "layer count {} must be below the object count {total}",
            layer_sizes.len()
        )));
    }
    if layer_sizes.iter().any(|&s| s == 0) {
        return Err(PlanError::invalid("every layer needs at least one object"));
    }
    if layer_sizes.iter().sum::<usize>() != total {
        return Err(PlanError::invalid(format!(
            "layer sizes must sum to the object count {total}"
        )));
    }
    if layer_sizes.windows(2).any(|w| w[0] < w[1]) {
        return Err(PlanError::invalid(
            "layer sizes must be non-increasing so each block fits below",
        ));
    }
    Ok(())
}
