//! Directed-cycle discovery for the cutting-plane loop.
//!
//! `find_cycles` does one depth-first sweep and reports the path cycle behind
//! every back edge it meets. That is deliberately not an enumeration of all
//! simple cycles: the feedback-set solver adds these as violated constraints
//! lazily and re-solves, so each sweep only needs to witness that cycles
//! remain and hand back a useful batch of them.

use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use std::collections::BTreeMap;

use super::types::{EdgeTag, ObjectId};

pub fn is_acyclic(g: &DiGraphMap<ObjectId, EdgeTag>) -> bool {
    !is_cyclic_directed(g)
}

/// Collect one directed cycle per back edge of a single DFS sweep.
pub fn find_cycles(g: &DiGraphMap<ObjectId, EdgeTag>) -> Vec<Vec<ObjectId>> {
    let mut finder = CycleFinder {
        g,
        mark: BTreeMap::new(),
        path: Vec::new(),
        cycles: Vec::new(),
    };
    let roots: Vec<ObjectId> = g.nodes().collect();
    for r in roots {
        if !finder.mark.contains_key(&r) {
            finder.visit(r);
        }
    }
    finder.cycles
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

struct CycleFinder<'a> {
    g: &'a DiGraphMap<ObjectId, EdgeTag>,
    mark: BTreeMap<ObjectId, Mark>,
    path: Vec<ObjectId>,
    cycles: Vec<Vec<ObjectId>>,
}

impl CycleFinder<'_> {
    fn visit(&mut self, u: ObjectId) {
        self.mark.insert(u, Mark::Active);
        self.path.push(u);
        let succs: Vec<ObjectId> = self.g.neighbors(u).collect();
        for v in succs {
            match self.mark.get(&v) {
                None => self.visit(v),
                Some(Mark::Active) => {
                    // Back edge u -> v: the path suffix from v is a cycle.
                    if let Some(pos) = self.path.iter().position(|&p| p == v) {
                        self.cycles.push(self.path[pos..].to_vec());
                    }
                }
                Some(Mark::Done) => {}
            }
        }
        self.path.pop();
        self.mark.insert(u, Mark::Done);
    }
}
