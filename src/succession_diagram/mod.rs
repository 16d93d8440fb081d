//! The succession diagram: a lazily expanded DAG of percolated trap spaces,
//! ordered by inclusion.
//!
//! Nodes are deduplicated by the canonical key of their space, so the diagram
//! is a DAG even when the same trap space is reachable through different stable
//! motifs. The root is the percolation of the whole state space. A node is
//! *expanded* once its maximal trap sub-spaces have been enumerated and wired
//! as children; an expanded node without children is a *minimal* trap space
//! (modulo the folding of motionless variables under block expansion).

use crate::petri_net::PetriNet;
use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
use crate::{AnalysisConfig, AnalysisError, BooleanNetwork, Space, VariableId};
use num_bigint::BigUint;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

/// **(internal)** The expansion step: percolation, oracle call, child wiring.
mod _impl_expansion;
/// **(internal)** Whole-diagram expansion strategies (BFS, DFS, minimal, target, blocks).
mod _impl_strategies;
/// **(internal)** Summary and attractor-related queries.
mod _impl_queries;

pub use _impl_queries::SdSummary;

/// A stable integer id of a succession diagram node.
pub type NodeId = usize;

/// The state of one succession diagram node.
///
/// The percolated network, Petri net and NFVS caches are populated on demand
/// and can be dropped at any time without affecting correctness.
pub struct SdNode {
    /// The trap space of this node; always equal to its own percolation.
    pub(crate) space: Space,
    /// Length of the longest path from the root to this node.
    pub(crate) depth: usize,
    /// Whether the children of this node have been computed.
    pub(crate) expanded: bool,
    /// Set when a resource limit interrupted an operation on this node;
    /// attractor queries on such nodes report no results ("unknown").
    pub(crate) over_budget: bool,
    /// Free variables of this node that were *folded* by block expansion:
    /// motionless variables with no influence on the rest of the node.
    pub(crate) folded_variables: Vec<VariableId>,
    pub(crate) parents: Vec<NodeId>,
    /// `None` when unexpanded, otherwise the sorted list of child nodes.
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) percolated_network: Option<BooleanNetwork>,
    pub(crate) percolated_petri_net: Option<PetriNet>,
    pub(crate) percolated_nfvs: Option<Vec<VariableId>>,
    /// States covering every attractor whose minimal trap space is this node
    /// (an over-approximation, one candidate may cover no attractor).
    pub(crate) attractor_candidates: Option<Vec<Space>>,
    /// One representative state per attractor of this node.
    pub(crate) attractor_seeds: Option<Vec<Space>>,
    /// The fully enumerated attractor state sets, computed on demand.
    pub(crate) attractor_sets: Option<Vec<VertexSet>>,
}

/// Succession diagram of a Boolean network.
///
/// Encodes the relationship between the network's trap spaces and is used for
/// attractor detection and control. The diagram is expanded lazily: it is not
/// built until [SuccessionDiagram::build] (or one of the `expand_*` methods)
/// is called.
pub struct SuccessionDiagram {
    pub(crate) network: BooleanNetwork,
    pub(crate) graph: SymbolicAsyncGraph,
    pub(crate) petri_net: PetriNet,
    pub(crate) nodes: Vec<SdNode>,
    /// The stable motif of each parent -> child edge (the un-percolated maximal
    /// trap sub-space through which the child was discovered).
    pub(crate) edges: HashMap<(NodeId, NodeId), Space>,
    /// Maps canonical space keys to node ids (see [Space::unique_key]).
    pub(crate) node_indices: HashMap<BigUint, NodeId>,
    pub(crate) config: AnalysisConfig,
}

impl SuccessionDiagram {
    /// Create an unexpanded succession diagram of the given network.
    pub fn new(network: BooleanNetwork, config: AnalysisConfig) -> SuccessionDiagram {
        let graph = SymbolicAsyncGraph::new(&network);
        let petri_net = PetriNet::new(&graph);
        let mut sd = SuccessionDiagram {
            network,
            graph,
            petri_net,
            nodes: Vec::new(),
            edges: HashMap::new(),
            node_indices: HashMap::new(),
            config,
        };
        // Create the unexpanded root: the percolation of the full space.
        sd.ensure_node(None, &Space::new_raw(sd.network.num_vars()))
            .expect("The first node cannot exceed the node limit.");
        sd
    }

    /// Create a succession diagram from a `.bnet` model string.
    pub fn from_bnet(model: &str, config: AnalysisConfig) -> Result<SuccessionDiagram, AnalysisError> {
        let network = BooleanNetwork::try_from_bnet(model)?;
        Ok(SuccessionDiagram::new(network, config))
    }

    /// The analysed network.
    pub fn as_network(&self) -> &BooleanNetwork {
        &self.network
    }

    /// The shared symbolic encoding of the network dynamics.
    pub fn as_graph(&self) -> &SymbolicAsyncGraph {
        &self.graph
    }

    /// The configuration of this diagram.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The number of nodes in the diagram.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root node (percolation of the whole state space).
    pub fn root(&self) -> NodeId {
        0
    }

    /// The longest root-to-node path length in the current diagram.
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|node| node.depth).max().unwrap_or(0)
    }

    /// An iterator over all node ids.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        0..self.nodes.len()
    }

    /// An iterator over the expanded node ids.
    pub fn expanded_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|id| self.nodes[*id].expanded)
    }

    /// An iterator over the unexpanded ("stub") node ids.
    pub fn stub_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_ids().filter(|id| !self.nodes[*id].expanded)
    }

    /// The trap space of the given node.
    pub fn node_space(&self, id: NodeId) -> &Space {
        &self.nodes[id].space
    }

    /// The depth of the given node.
    pub fn node_depth(&self, id: NodeId) -> usize {
        self.nodes[id].depth
    }

    /// True if the node has been expanded.
    pub fn node_is_expanded(&self, id: NodeId) -> bool {
        self.nodes[id].expanded
    }

    /// True if an operation on this node hit a resource limit; attractor
    /// queries on the node report no results.
    pub fn node_is_over_budget(&self, id: NodeId) -> bool {
        self.nodes[id].over_budget
    }

    /// True if the node is known to be a *minimal* trap space: it is expanded,
    /// has no children, and no free variable was folded away by block expansion.
    pub fn node_is_minimal(&self, id: NodeId) -> bool {
        let node = &self.nodes[id];
        node.expanded
            && node.children.as_ref().is_some_and(|c| c.is_empty())
            && node.folded_variables.is_empty()
    }

    /// The parents of the given node.
    pub fn node_parents(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id].parents
    }

    /// The children of the given node, or `None` when unexpanded.
    pub fn node_children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes[id].children.as_deref()
    }

    /// Find the node holding exactly the given space, if it exists.
    /// The space is percolated first, like during node creation.
    pub fn find_node(&self, space: &Space) -> Option<NodeId> {
        let percolated = self.graph.percolate_space(space);
        self.node_indices.get(&percolated.unique_key()).cloned()
    }

    /// The stable motif of the `parent -> child` edge. With `reduced`, the
    /// fixings already present in the parent's space are stripped.
    pub fn edge_stable_motif(&self, parent: NodeId, child: NodeId, reduced: bool) -> Space {
        let motif = self.edges[&(parent, child)].clone();
        if !reduced {
            return motif;
        }
        let mut result = motif;
        for (var, _) in self.nodes[parent].space.to_values() {
            result[var] = crate::ExtendedBoolean::Any;
        }
        result
    }

    /// The minimal trap spaces discovered by the current expansion state.
    ///
    /// Folded motionless variables are completed back in, so the result agrees
    /// with the fully expanded diagram whenever the chosen strategy guarantees
    /// coverage of all minimal trap spaces.
    pub fn minimal_trap_spaces(&self) -> Vec<Space> {
        let mut result = Vec::new();
        for id in self.node_ids() {
            let node = &self.nodes[id];
            let is_leaf = node.expanded && node.children.as_ref().is_some_and(|c| c.is_empty());
            if !is_leaf {
                continue;
            }
            if node.folded_variables.is_empty() {
                result.push(node.space.clone());
            } else {
                result.extend(node.space.completions_over(&node.folded_variables));
            }
        }
        result.sort_by_key(|space| space.unique_key());
        result.dedup();
        result
    }

    /// **(internal)** The deterministic per-node random generator.
    pub(crate) fn node_rng(&self, id: NodeId) -> StdRng {
        let stream = (id as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(self.config.rng_seed ^ stream)
    }
}

#[cfg(test)]
mod tests {
    use crate::succession_diagram::SuccessionDiagram;
    use crate::{AnalysisConfig, ExtendedBoolean};

    #[test]
    fn fresh_diagram_has_percolated_root() {
        // `b` is forced to 1 by the constant `a`.
        let sd = SuccessionDiagram::from_bnet(
            r"
            targets, factors
            a, 1
            b, a | b
            c, !b & c
        ",
            AnalysisConfig::default(),
        )
        .unwrap();

        assert_eq!(1, sd.len());
        assert_eq!(0, sd.root());
        assert!(!sd.node_is_expanded(sd.root()));
        assert_eq!(vec![sd.root()], sd.stub_ids().collect::<Vec<_>>());
        assert_eq!(0, sd.expanded_ids().count());

        let network = sd.as_network();
        let a = network.as_graph().find_variable("a").unwrap();
        let b = network.as_graph().find_variable("b").unwrap();
        let c = network.as_graph().find_variable("c").unwrap();
        let root = sd.node_space(sd.root());
        assert_eq!(ExtendedBoolean::One, root[a]);
        assert_eq!(ExtendedBoolean::One, root[b]);
        assert_eq!(ExtendedBoolean::Zero, root[c]);
    }
}
