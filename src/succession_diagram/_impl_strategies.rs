use crate::signed_graph::SdGraph;
use crate::succession_diagram::{NodeId, SuccessionDiagram};
use crate::trap_spaces::{TrapSpaceProblem, TrapSpaces};
use crate::{should_log, AnalysisError, ExpansionStrategy, Space, VariableId};
use std::collections::{BTreeSet, HashSet};

/// Whole-diagram expansion strategies.
///
/// Every strategy returns `Ok(true)` when it ran to completion and `Ok(false)`
/// when some node could not be expanded within the configured resource limits
/// (such nodes are marked over-budget and their subtrees stay unexplored).
/// Only fatal errors are returned as `Err`.
impl SuccessionDiagram {
    /// Expand the diagram using the strategy selected by the configuration.
    pub fn build(&mut self) -> Result<bool, AnalysisError> {
        match self.config.expansion.clone() {
            ExpansionStrategy::Bfs => self.expand_bfs(),
            ExpansionStrategy::Dfs => self.expand_dfs(),
            ExpansionStrategy::MinimalSpaces => self.expand_minimal_spaces(),
            ExpansionStrategy::Target(target) => self.expand_to_target(&target),
            ExpansionStrategy::Blocks => self.expand_blocks(),
        }
    }

    /// Expand every node reachable from the root, breadth-first.
    pub fn expand_bfs(&mut self) -> Result<bool, AnalysisError> {
        let root = self.root();
        let mut complete = true;

        let mut seen = HashSet::from([root]);
        let mut current_level = vec![root];
        let mut next_level: Vec<NodeId> = Vec::new();

        while !current_level.is_empty() {
            for node in current_level {
                if !self.try_expand_node(node)? {
                    complete = false;
                    continue;
                }
                let successors = self.node_successors(node, false)?;
                for s in successors {
                    if seen.insert(s) {
                        next_level.push(s);
                    }
                }
            }
            next_level.sort_unstable();
            current_level = next_level;
            next_level = Vec::new();
        }

        Ok(complete)
    }

    /// Expand every node reachable from the root, depth-first. The set of
    /// nodes is the same as for [SuccessionDiagram::expand_bfs], only the
    /// exploration order differs.
    pub fn expand_dfs(&mut self) -> Result<bool, AnalysisError> {
        let root = self.root();
        let mut complete = true;

        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            if !self.try_expand_node(node)? {
                complete = false;
                continue;
            }
            let mut successors = self.node_successors(node, false)?;
            // Reversed so that the smallest successor is explored first.
            successors.sort_unstable();
            successors.reverse();
            for s in successors {
                if seen.insert(s) {
                    stack.push(s);
                }
            }
        }

        Ok(complete)
    }

    /// Expand the diagram only as far as necessary to materialise every
    /// minimal trap space as a node; branches that contain no undiscovered
    /// minimal trap space are left as stubs.
    pub fn expand_minimal_spaces(&mut self) -> Result<bool, AnalysisError> {
        let root = self.root();
        let within = self.node_space(root).clone();
        let net = self.node_percolated_petri_net(root);
        let mut remaining = TrapSpaces::enumerate(
            &net,
            &within,
            TrapSpaceProblem::Min,
            &[],
            false,
            None,
            self.config.solver_timeout_ms,
        )?;

        let mut complete = true;
        let mut seen = HashSet::from([root]);
        let mut stack = vec![root];

        while let Some(node) = stack.pop() {
            let node_space = self.node_space(node).clone();
            let covers_remaining = remaining.iter().any(|m| m.is_subspace(&node_space));
            if !covers_remaining {
                // Every minimal trap space below this node is already
                // in the diagram.
                continue;
            }

            if !self.try_expand_node(node)? {
                complete = false;
                continue;
            }

            let successors = self.node_successors(node, false)?;
            if successors.is_empty() {
                // A minimal trap space has been materialised.
                remaining.retain(|m| *m != node_space);
                continue;
            }

            let mut successors = successors;
            successors.sort_unstable();
            successors.reverse();
            for s in successors {
                let covers = remaining
                    .iter()
                    .any(|m| m.is_subspace(self.node_space(s)));
                if covers && seen.insert(s) {
                    stack.push(s);
                }
            }
        }

        Ok(complete && remaining.is_empty())
    }

    /// Expand only nodes whose space contains the given `target` trap space
    /// (nodes that contradict the target, and nodes already inside it, are
    /// kept as stubs). This is the expansion mode used by target control.
    pub fn expand_to_target(&mut self, target: &Space) -> Result<bool, AnalysisError> {
        let root = self.root();
        let mut complete = true;

        let mut seen = HashSet::from([root]);
        let mut current_level = vec![root];
        let mut next_level: Vec<NodeId> = Vec::new();

        while !current_level.is_empty() {
            for node in current_level {
                let node_space = self.node_space(node).clone();

                if node_space.intersect(target).is_none() {
                    // The node is not relevant for the target; keep as a stub.
                    continue;
                }
                if node_space.is_subspace(target) && node_space != *target {
                    // Expanding below the target adds no information.
                    continue;
                }

                if !self.try_expand_node(node)? {
                    complete = false;
                    continue;
                }
                for s in self.node_successors(node, false)? {
                    if seen.insert(s) {
                        next_level.push(s);
                    }
                }
            }
            next_level.sort_unstable();
            current_level = next_level;
            next_level = Vec::new();
        }

        Ok(complete)
    }

    /// Expand the diagram using block decomposition: source-variable
    /// combinations are fixed at the root, and afterwards each node only
    /// recurses into the successors of one *minimal block* of its free
    /// variables. Independent motionless variables are folded away entirely
    /// (see [SuccessionDiagram::minimal_trap_spaces]).
    pub fn expand_blocks(&mut self) -> Result<bool, AnalysisError> {
        let root = self.root();
        let mut complete = true;

        let mut current_level: Vec<NodeId> = Vec::new();

        // Fix all source-variable combinations directly at the root.
        let root_network = self.node_percolated_network(root);
        let sources = root_network.source_variables();
        if sources.is_empty() {
            current_level.push(root);
        } else {
            if sources.len() >= usize::BITS as usize
                || (1usize << sources.len()) > self.config.max_motifs_per_node
            {
                self.nodes[root].over_budget = true;
                return Ok(false);
            }
            if should_log(self.config.log_level()) {
                println!(
                    "[{}] Expanding {} source variable(s) into {} combination(s).",
                    root,
                    sources.len(),
                    1usize << sources.len()
                );
            }
            let root_space = self.node_space(root).clone();
            let mut children = Vec::new();
            for combination in root_space.completions_over(&sources) {
                children.push(self.ensure_node(Some(root), &combination)?);
            }
            children.sort_unstable();
            children.dedup();
            current_level = children.clone();
            let node = &mut self.nodes[root];
            node.children = Some(children);
            node.expanded = true;
            // Fixing source combinations creates no attractors in the root.
            node.attractor_candidates = Some(Vec::new());
            node.attractor_seeds = Some(Vec::new());
            node.attractor_sets = Some(Vec::new());
        }

        let mut seen: HashSet<NodeId> = current_level.iter().cloned().collect();
        seen.insert(root);

        while !current_level.is_empty() {
            current_level.sort_unstable();
            let mut next_level = Vec::new();
            for node in current_level {
                if self.nodes[node].expanded {
                    // Re-discovered a previously expanded node.
                    continue;
                }
                match self.expand_node_with_blocks(node)? {
                    Some(descend) => {
                        for s in descend {
                            if seen.insert(s) {
                                next_level.push(s);
                            }
                        }
                    }
                    None => complete = false,
                }
            }
            current_level = next_level;
        }

        Ok(complete)
    }

    /// **(internal)** One block-decomposition expansion step. Returns the
    /// successors to descend into, or `None` when the node went over budget.
    fn expand_node_with_blocks(
        &mut self,
        id: NodeId,
    ) -> Result<Option<Vec<NodeId>>, AnalysisError> {
        let space = self.node_space(id).clone();

        if space.is_singleton() {
            self.commit_block_leaf(id, Vec::new());
            return Ok(Some(Vec::new()));
        }

        let net = self.node_percolated_petri_net(id);
        let motifs = TrapSpaces::enumerate(
            &net,
            &space,
            TrapSpaceProblem::Max,
            &[],
            false,
            Some(self.config.max_motifs_per_node),
            self.config.solver_timeout_ms,
        );
        let motifs = match motifs {
            Ok(motifs) if motifs.len() < self.config.max_motifs_per_node => motifs,
            Ok(_) | Err(AnalysisError::Timeout { .. }) | Err(AnalysisError::BudgetExceeded { .. }) => {
                self.nodes[id].over_budget = true;
                return Ok(None);
            }
            Err(fatal) => return Err(fatal),
        };

        let motifs: Vec<Space> = motifs
            .into_iter()
            .filter(|motif| self.graph.percolate_space(motif) != space)
            .collect();

        if motifs.is_empty() {
            // A genuine minimal trap space.
            self.commit_block_leaf(id, Vec::new());
            return Ok(Some(Vec::new()));
        }

        // Partition the motifs into blocks: the backward closure of the motif's
        // new fixings within the node's free variables.
        let node_network = self.node_percolated_network(id);
        let sd_graph = SdGraph::from(node_network.as_graph());
        let free_variables: HashSet<VariableId> = space.free_variables().into_iter().collect();

        // A variable can be folded when it is motionless and influences no
        // other free variable of this node.
        let foldable: HashSet<VariableId> = net
            .source_variables()
            .into_iter()
            .filter(|var| {
                node_network
                    .as_graph()
                    .targets(*var)
                    .into_iter()
                    .all(|target| target == *var || !free_variables.contains(&target))
            })
            .collect();

        let mut blocks: Vec<(BTreeSet<VariableId>, Vec<Space>)> = Vec::new();
        let mut folded: BTreeSet<VariableId> = BTreeSet::new();
        for motif in motifs {
            let mut new_fixings = HashSet::new();
            for (var, _) in motif.to_values() {
                if space[var].is_any() {
                    new_fixings.insert(var);
                }
            }
            let closure = sd_graph.restricted_backward_reachable(&free_variables, new_fixings);
            let block: BTreeSet<VariableId> = closure.into_iter().collect();
            if !block.is_empty() && block.iter().all(|var| foldable.contains(var)) {
                // An independent choice with no dynamics: fold it away.
                folded.extend(block);
                continue;
            }
            if let Some((_, members)) = blocks.iter_mut().find(|(b, _)| *b == block) {
                members.push(motif);
            } else {
                blocks.push((block, vec![motif]));
            }
        }

        if blocks.is_empty() {
            let folded: Vec<VariableId> = folded.into_iter().collect();
            if should_log(self.config.log_level()) {
                println!("[{}] Folding {} motionless variable(s).", id, folded.len());
            }
            self.commit_block_leaf(id, folded);
            return Ok(Some(Vec::new()));
        }

        // Keep only inclusion-minimal blocks; they are mutually independent and
        // expanding any one of them preserves all minimal trap spaces.
        let minimal_blocks: Vec<&(BTreeSet<VariableId>, Vec<Space>)> = blocks
            .iter()
            .filter(|(block, _)| !blocks.iter().any(|(other, _)| other != block && other.is_subset(block)))
            .collect();

        // Pick the minimal block with the fewest successors (deterministic
        // tie-break on the smallest member id).
        let chosen = minimal_blocks
            .iter()
            .min_by_key(|(block, members)| (members.len(), block.iter().next().cloned()))
            .expect("At least one minimal block exists.");
        let chosen_block = chosen.0.clone();

        if should_log(self.config.log_level()) {
            println!(
                "[{}] Computed {} block(s), descending into a block of {} variable(s) with {} successor(s).",
                id,
                blocks.len(),
                chosen_block.len(),
                chosen.1.len()
            );
        }

        // All (non-folded) motifs become children; only the chosen block's
        // children are explored further.
        let mut children = Vec::new();
        let mut descend = Vec::new();
        for (block, members) in &blocks {
            for motif in members {
                let child = self.ensure_node(Some(id), motif)?;
                children.push(child);
                if *block == chosen_block {
                    descend.push(child);
                }
            }
        }
        children.sort_unstable();
        children.dedup();
        descend.sort_unstable();
        descend.dedup();

        let folded: Vec<VariableId> = folded.into_iter().collect();
        let node = &mut self.nodes[id];
        node.attractor_candidates = None;
        node.attractor_seeds = None;
        node.attractor_sets = None;
        node.children = Some(children);
        node.folded_variables = folded;
        node.expanded = true;

        Ok(Some(descend))
    }

    /// **(internal)** Mark a node as an expanded leaf, possibly with folded
    /// motionless variables.
    fn commit_block_leaf(&mut self, id: NodeId, folded: Vec<VariableId>) {
        let node = &mut self.nodes[id];
        node.children = Some(Vec::new());
        node.folded_variables = folded;
        node.expanded = true;
    }
}

#[cfg(test)]
mod tests {
    use crate::succession_diagram::SuccessionDiagram;
    use crate::{AnalysisConfig, ExpansionStrategy};

    /// The source-combination example: two sources, one conjunction and one
    /// variable that becomes motionless when `A = 0`.
    const SOURCE_MODEL: &str = r"
        targets, factors
        A, A
        B, B
        C, A & B
        D, D | A
    ";

    #[test]
    fn bfs_and_dfs_agree_on_nodes() {
        let mut bfs = SuccessionDiagram::from_bnet(SOURCE_MODEL, AnalysisConfig::default()).unwrap();
        assert!(bfs.expand_bfs().unwrap());

        let mut config = AnalysisConfig::default();
        config.expansion = ExpansionStrategy::Dfs;
        let mut dfs = SuccessionDiagram::from_bnet(SOURCE_MODEL, config).unwrap();
        assert!(dfs.build().unwrap());

        assert_eq!(bfs.len(), dfs.len());
        let bfs_spaces: Vec<_> = bfs.node_ids().map(|id| bfs.node_space(id).clone()).collect();
        for space in bfs_spaces {
            assert!(dfs.find_node(&space).is_some());
        }
        assert_eq!(bfs.minimal_trap_spaces(), dfs.minimal_trap_spaces());
    }

    #[test]
    fn full_expansion_of_source_model() {
        let mut sd = SuccessionDiagram::from_bnet(SOURCE_MODEL, AnalysisConfig::default()).unwrap();
        assert!(sd.expand_bfs().unwrap());

        // Root + 4 source combinations + 4 fixed points below A=0.
        assert_eq!(9, sd.len());

        // The source combinations appear as the root's children.
        let children = sd.node_children(sd.root()).unwrap();
        assert_eq!(4, children.len());

        // 6 minimal trap spaces in total, all of them fixed points.
        let minimal = sd.minimal_trap_spaces();
        assert_eq!(6, minimal.len());
        for space in &minimal {
            assert!(space.is_singleton());
            assert!(sd.as_graph().is_trap_space(space));
        }
    }

    #[test]
    fn block_expansion_folds_motionless_variables() {
        let mut config = AnalysisConfig::default();
        config.expansion = ExpansionStrategy::Blocks;
        let mut sd = SuccessionDiagram::from_bnet(SOURCE_MODEL, config).unwrap();
        assert!(sd.build().unwrap());

        // Root + 4 source combinations; the D-choice below A=0 is folded.
        assert_eq!(5, sd.len());

        // The folded diagram still reports the same minimal trap spaces
        // as the full expansion.
        let mut full = SuccessionDiagram::from_bnet(SOURCE_MODEL, AnalysisConfig::default()).unwrap();
        full.expand_bfs().unwrap();
        assert_eq!(full.minimal_trap_spaces(), sd.minimal_trap_spaces());
    }

    #[test]
    fn target_expansion_materialises_the_target() {
        use crate::{ExtendedBoolean, Space};

        let mut config = AnalysisConfig::default();
        let num_vars = 4;
        let mut target = Space::new_raw(num_vars);
        // A = 1, B = 1 percolates to the fixed point 1111.
        target[crate::VariableId::from_index(0)] = ExtendedBoolean::One;
        target[crate::VariableId::from_index(1)] = ExtendedBoolean::One;
        target[crate::VariableId::from_index(2)] = ExtendedBoolean::One;
        target[crate::VariableId::from_index(3)] = ExtendedBoolean::One;
        config.expansion = ExpansionStrategy::Target(target.clone());

        let mut sd = SuccessionDiagram::from_bnet(SOURCE_MODEL, config).unwrap();
        assert!(sd.build().unwrap());

        // The target node exists, while irrelevant branches stay as stubs.
        let node = sd.find_node(&target).unwrap();
        assert!(sd.node_space(node).is_subspace(&target));
        assert!(sd.len() < 9);
    }

    #[test]
    fn minimal_space_expansion_covers_all_minimal_traps() {
        let mut config = AnalysisConfig::default();
        config.expansion = ExpansionStrategy::MinimalSpaces;
        let mut sd = SuccessionDiagram::from_bnet(SOURCE_MODEL, config).unwrap();
        assert!(sd.build().unwrap());

        let mut full = SuccessionDiagram::from_bnet(SOURCE_MODEL, AnalysisConfig::default()).unwrap();
        full.expand_bfs().unwrap();

        assert_eq!(full.minimal_trap_spaces(), sd.minimal_trap_spaces());
        // The lazy expansion does not need more nodes than the full one.
        assert!(sd.len() <= full.len());
    }
}
