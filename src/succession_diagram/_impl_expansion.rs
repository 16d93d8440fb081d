use crate::config::op_interrupt;
use crate::petri_net::PetriNet;
use crate::succession_diagram::{NodeId, SdNode, SuccessionDiagram};
use crate::trap_spaces::{TrapSpaceProblem, TrapSpaces};
use crate::{should_log, AnalysisError, BooleanNetwork, Space, VariableId};

/// **(internal)** The per-node expansion state machine. External oracle calls
/// happen on the `BlocksComputed -> ChildrenRequested` transition; everything
/// after `ChildrenRequested` commits atomically, so a cancelled expansion never
/// leaves a half-expanded node.
enum ExpansionStage {
    Fresh,
    Percolated(Space),
    BlocksComputed(Space),
    ChildrenRequested(Vec<Space>),
    Expanded(Vec<Space>),
}

/// Node creation and bookkeeping.
impl SuccessionDiagram {
    /// Ensure that the percolation of `motif` exists as a node, wired below
    /// `parent` (when given). Returns the id of the (existing or new) node.
    pub(crate) fn ensure_node(
        &mut self,
        parent: Option<NodeId>,
        motif: &Space,
    ) -> Result<NodeId, AnalysisError> {
        let space = self.graph.percolate_space(motif);
        let key = space.unique_key();

        let id = if let Some(id) = self.node_indices.get(&key) {
            *id
        } else {
            if self.nodes.len() >= self.config.max_sd_nodes {
                return Err(AnalysisError::BudgetExceeded {
                    what: "succession diagram nodes".to_string(),
                    limit: self.config.max_sd_nodes,
                });
            }
            let id = self.nodes.len();
            self.nodes.push(SdNode {
                space,
                depth: 0,
                expanded: false,
                over_budget: false,
                folded_variables: Vec::new(),
                parents: Vec::new(),
                children: None,
                percolated_network: None,
                percolated_petri_net: None,
                percolated_nfvs: None,
                attractor_candidates: None,
                attractor_seeds: None,
                attractor_sets: None,
            });
            self.node_indices.insert(key, id);
            id
        };

        if let Some(parent) = parent {
            self.ensure_edge(parent, id, motif.clone());
        }
        Ok(id)
    }

    /// **(internal)** Record the `parent -> child` edge (keeping the first
    /// discovered stable motif) and update the child's depth.
    fn ensure_edge(&mut self, parent: NodeId, child: NodeId, motif: Space) {
        self.edges.entry((parent, child)).or_insert(motif);
        if !self.nodes[child].parents.contains(&parent) {
            self.nodes[child].parents.push(parent);
        }
        let parent_depth = self.nodes[parent].depth;
        let child_depth = &mut self.nodes[child].depth;
        *child_depth = std::cmp::max(*child_depth, parent_depth + 1);
    }
}

/// Per-node caches.
impl SuccessionDiagram {
    /// The network with the node's space substituted into every update function.
    pub(crate) fn node_percolated_network(&mut self, id: NodeId) -> BooleanNetwork {
        if self.nodes[id].percolated_network.is_none() {
            let network = self.network.percolate(&self.nodes[id].space);
            self.nodes[id].percolated_network = Some(network);
        }
        self.nodes[id].percolated_network.clone().unwrap()
    }

    /// The Petri-net encoding restricted to the node's space.
    pub(crate) fn node_percolated_petri_net(&mut self, id: NodeId) -> PetriNet {
        if self.nodes[id].percolated_petri_net.is_none() {
            let net = PetriNet::for_space(&self.graph, &self.nodes[id].space);
            self.nodes[id].percolated_petri_net = Some(net);
        }
        self.nodes[id].percolated_petri_net.clone().unwrap()
    }

    /// A negative feedback vertex set of the node's percolated network. The
    /// result only contains free variables of the node.
    pub(crate) fn node_percolated_nfvs(&mut self, id: NodeId) -> Vec<VariableId> {
        if self.nodes[id].percolated_nfvs.is_none() {
            let network = self.node_percolated_network(id);
            let mut nfvs: Vec<VariableId> = network
                .as_graph()
                .negative_feedback_vertex_set()
                .into_iter()
                .collect();
            nfvs.sort();
            self.nodes[id].percolated_nfvs = Some(nfvs);
        }
        self.nodes[id].percolated_nfvs.clone().unwrap()
    }
}

/// The expansion step itself.
impl SuccessionDiagram {
    /// Expand a single node: enumerate its maximal trap sub-spaces (stable
    /// motifs) and wire their percolations as children. Does nothing when the
    /// node is already expanded.
    ///
    /// The `interrupt` callback is polled between the stages of the expansion
    /// state machine and can cancel the operation; the diagram then stays in
    /// the state before the call (modulo freshly cached intermediate data).
    pub fn expand_node<F: Fn() -> Result<(), AnalysisError>>(
        &mut self,
        id: NodeId,
        interrupt: &F,
    ) -> Result<(), AnalysisError> {
        if self.nodes[id].expanded {
            return Ok(());
        }

        let mut stage = ExpansionStage::Fresh;
        loop {
            interrupt()?;
            stage = match stage {
                ExpansionStage::Fresh => {
                    // Node spaces are percolated on creation; this transition
                    // re-establishes the invariant.
                    let space = self.nodes[id].space.clone();
                    let space = self.graph.percolate_space(&space);
                    ExpansionStage::Percolated(space)
                }
                ExpansionStage::Percolated(space) => {
                    if space.is_singleton() {
                        // A fixed point; the oracle would just return it back.
                        if should_log(self.config.log_level()) {
                            println!("[{}] Found fixed-point: {}.", id, space);
                        }
                        ExpansionStage::Expanded(Vec::new())
                    } else {
                        // Materialize the restricted Petri net for the oracle.
                        self.node_percolated_petri_net(id);
                        ExpansionStage::BlocksComputed(space)
                    }
                }
                ExpansionStage::BlocksComputed(space) => {
                    let net = self.node_percolated_petri_net(id);
                    // Source-variable combinations are folded at the root only;
                    // deeper nodes enumerate their stable motifs unrestricted.
                    let fix_sources = id == self.root();
                    let motifs = TrapSpaces::enumerate(
                        &net,
                        &space,
                        TrapSpaceProblem::Max,
                        &[],
                        fix_sources,
                        Some(self.config.max_motifs_per_node),
                        self.config.solver_timeout_ms,
                    )?;
                    if motifs.len() >= self.config.max_motifs_per_node {
                        return Err(AnalysisError::BudgetExceeded {
                            what: format!("stable motifs of node {}", id),
                            limit: self.config.max_motifs_per_node,
                        });
                    }
                    ExpansionStage::ChildrenRequested(motifs)
                }
                ExpansionStage::ChildrenRequested(motifs) => {
                    let space = self.nodes[id].space.clone();
                    let mut progressing = Vec::new();
                    for motif in motifs {
                        interrupt()?;
                        let percolated = self.graph.percolate_space(&motif);
                        if percolated == space {
                            // The motif percolates back to the node itself;
                            // no progress is made by this child.
                            continue;
                        }
                        progressing.push(motif);
                    }
                    if should_log(self.config.log_level()) {
                        println!("[{}] Found {} stable motif(s).", id, progressing.len());
                    }
                    ExpansionStage::Expanded(progressing)
                }
                ExpansionStage::Expanded(motifs) => {
                    // Atomic commit: create the children, wire the edges and
                    // mark the node expanded without any interrupt in between.
                    let mut children = Vec::new();
                    for motif in &motifs {
                        let child = self.ensure_node(Some(id), motif)?;
                        children.push(child);
                    }
                    children.sort_unstable();
                    children.dedup();
                    let node = &mut self.nodes[id];
                    // Attractor data computed for the unexpanded node is no
                    // longer valid once children exist.
                    node.attractor_candidates = None;
                    node.attractor_seeds = None;
                    node.attractor_sets = None;
                    node.children = Some(children);
                    node.expanded = true;
                    return Ok(());
                }
            };
        }
    }

    /// Expand a node, absorbing recoverable failures into the node state:
    /// returns `Ok(true)` when the node is expanded, `Ok(false)` when it was
    /// marked as over-budget, and an error only for fatal failures.
    pub(crate) fn try_expand_node(&mut self, id: NodeId) -> Result<bool, AnalysisError> {
        let interrupt = op_interrupt("node expansion", self.config.op_timeout);
        match self.expand_node(id, &interrupt) {
            Ok(()) => Ok(true),
            Err(error) if error.is_recoverable() => {
                if should_log(self.config.log_level()) {
                    println!("[{}] Expansion failed (recoverable): {}.", id, error);
                }
                self.nodes[id].over_budget = true;
                Ok(false)
            }
            Err(fatal) => Err(fatal),
        }
    }

    /// The children of the given node. With `compute`, an unexpanded node is
    /// expanded first; otherwise unexpanded nodes report no successors.
    pub fn node_successors(
        &mut self,
        id: NodeId,
        compute: bool,
    ) -> Result<Vec<NodeId>, AnalysisError> {
        if !self.nodes[id].expanded && compute {
            self.try_expand_node(id)?;
        }
        Ok(self.nodes[id]
            .children
            .clone()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use crate::succession_diagram::SuccessionDiagram;
    use crate::AnalysisConfig;

    fn toggle_with_tail() -> SuccessionDiagram {
        SuccessionDiagram::from_bnet(
            r"
            targets, factors
            a, b
            b, a
            c, !c | a
        ",
            AnalysisConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn single_node_expansion() {
        let mut sd = toggle_with_tail();
        let root = sd.root();
        let children = sd.node_successors(root, true).unwrap();

        // The motifs a=b=0 and a=b=1 percolate to two distinct children.
        assert_eq!(2, children.len());
        assert!(sd.node_is_expanded(root));
        for child in children {
            assert!(!sd.node_is_expanded(child));
            assert!(sd.node_space(child) < sd.node_space(root));
            assert!(sd.node_parents(child).contains(&root));
            let motif = sd.edge_stable_motif(root, child, false);
            assert!(sd.node_space(child).is_subspace(&motif));
        }

        // Expanding again is a no-op.
        let repeated = sd.node_successors(root, true).unwrap();
        assert_eq!(2, repeated.len());
        assert_eq!(3, sd.len());
    }

    #[test]
    fn children_are_deduplicated_by_space() {
        let mut sd = toggle_with_tail();
        let root = sd.root();
        let children = sd.node_successors(root, true).unwrap();
        // Expand the children as well; a=1,b=1 leads to the fixed point 111,
        // a=0,b=0 is already minimal (c oscillates).
        for child in children.clone() {
            sd.node_successors(child, true).unwrap();
        }
        let minimal = sd.minimal_trap_spaces();
        assert_eq!(2, minimal.len());
        for space in &minimal {
            assert!(sd.as_graph().is_trap_space(space));
        }
    }

    #[test]
    fn node_budget_is_enforced() {
        let mut config = AnalysisConfig::default();
        config.max_sd_nodes = 1;
        let mut sd = SuccessionDiagram::from_bnet(
            r"
            targets, factors
            a, b
            b, a
        ",
            config,
        )
        .unwrap();
        let root = sd.root();
        // The expansion fails recoverably and marks the root over-budget.
        let expanded = sd.try_expand_node(root).unwrap();
        assert!(!expanded);
        assert!(sd.node_is_over_budget(root));
        assert!(!sd.node_is_expanded(root));

        // A fatal error is not produced.
        let children = sd.node_successors(root, false).unwrap();
        assert!(children.is_empty());
    }
}
