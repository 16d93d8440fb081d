//! A compact representation of the signed influence graph of a Boolean network,
//! together with the graph algorithms used by the rest of the crate: strongly
//! connected components, cycle detection, reachability closures and
//! (parity) feedback vertex sets.
//!
//! The *negative* feedback vertex set computed here drives attractor candidate
//! generation: fixing the NFVS variables removes every negative cycle, so all
//! attractors of the modified network collapse into fixed points.

use crate::{RegulatoryGraph, VariableId};
use std::collections::HashSet;
use std::ops::Add;
use Sign::{Negative, Positive};

/// **(internal)** Basic utility methods for manipulating the `SdGraph`.
mod _impl_sd_graph;

/// **(internal)** Compute basic reachability properties within the `SdGraph`.
mod _reachability;

/// **(internal)** Decomposition of the signed directed graph (or its subgraph)
/// into strongly connected components.
mod _strongly_connected_components;

/// **(internal)** Algorithms for detecting shortest cycles, including
/// positive/negative variants.
mod _cycle_detection;

/// **(internal)** Algorithm for computing an approximation of the minimum
/// feedback vertex set.
mod _feedback_vertex_set;

/// A sign enum that describes the monotonicity of influence-graph edges.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Sign {
    Positive,
    Negative,
}

/// A more efficient representation of the signed influence graph that can be
/// used for studying the structural properties of a `RegulatoryGraph`.
///
/// An edge with unknown monotonicity appears under both signs, which makes the
/// parity algorithms treat it conservatively.
#[derive(Clone, Debug)]
pub struct SdGraph {
    successors: Vec<Vec<(VariableId, Sign)>>,
    predecessors: Vec<Vec<(VariableId, Sign)>>,
}

impl Add for Sign {
    type Output = Sign;

    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Positive, Positive) => Positive,
            (Negative, Negative) => Positive,
            (Positive, Negative) => Negative,
            (Negative, Positive) => Negative,
        }
    }
}

/// Algorithms for analysing the underlying signed directed graph.
impl RegulatoryGraph {
    /// Compute all *non-trivial* strongly connected components of the influence
    /// graph. The result is sorted by component size.
    pub fn strongly_connected_components(&self) -> Vec<HashSet<VariableId>> {
        SdGraph::from(self).strongly_connected_components()
    }

    /// Compute the set of variables that, if removed, cause this graph to
    /// become acyclic.
    ///
    /// The method tries to obtain a minimal such set, but minimality is
    /// not guaranteed.
    pub fn feedback_vertex_set(&self) -> HashSet<VariableId> {
        let graph = SdGraph::from(self);
        graph.restricted_feedback_vertex_set(&graph.mk_all_vertices())
    }

    /// Compute the set of variables that, if removed, breaks every *negative*
    /// cycle of this graph.
    ///
    /// The result is deterministic for a fixed input. Positive cycles
    /// (including positive self-loops) may remain.
    pub fn negative_feedback_vertex_set(&self) -> HashSet<VariableId> {
        let graph = SdGraph::from(self);
        graph.restricted_negative_feedback_vertex_set(&graph.mk_all_vertices())
    }
}
