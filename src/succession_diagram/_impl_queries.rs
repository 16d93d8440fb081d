use crate::attractors;
use crate::succession_diagram::{NodeId, SuccessionDiagram};
use crate::symbolic::VertexSet;
use crate::{should_log, AnalysisError, Space};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// A structured overview of the current state of a [SuccessionDiagram], as
/// returned by [SuccessionDiagram::summary].
#[derive(Clone, Debug)]
pub struct SdSummary {
    /// The number of nodes in the diagram.
    pub n_nodes: usize,
    /// The longest root-to-leaf path.
    pub depth: usize,
    /// The ordering of network variables used when printing spaces.
    pub node_ordering: Vec<String>,
    /// The number of attractors identified in each expanded node (nodes
    /// without attractors are omitted).
    pub attractors_by_node: BTreeMap<NodeId, usize>,
}

impl Display for SdSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Succession Diagram with {} nodes and depth {}.",
            self.n_nodes, self.depth
        )?;
        writeln!(f, "State order: {}", self.node_ordering.join(", "))?;
        writeln!(f)?;
        writeln!(f, "Attractors by node:")?;
        for (node, count) in &self.attractors_by_node {
            writeln!(f, "  [{}]: {}", node, count)?;
        }
        Ok(())
    }
}

/// Attractor and summary queries.
impl SuccessionDiagram {
    /// Attractor candidates of the given node: states covering every attractor
    /// whose minimal trap space is this node. With `compute`, missing values
    /// are calculated; otherwise `None` is returned for unknown nodes.
    ///
    /// A node that previously exceeded its resource budget reports `None`
    /// ("unknown") without retrying.
    pub fn node_attractor_candidates(
        &mut self,
        id: NodeId,
        compute: bool,
    ) -> Result<Option<Vec<Space>>, AnalysisError> {
        if self.nodes[id].attractor_candidates.is_none() && compute && !self.nodes[id].over_budget {
            match attractors::compute_attractor_candidates(self, id) {
                Ok(candidates) => {
                    self.nodes[id].attractor_candidates = Some(candidates);
                }
                Err(error) if error.is_recoverable() => {
                    if should_log(self.config.log_level()) {
                        println!("[{}] Candidate computation failed (recoverable): {}.", id, error);
                    }
                    self.nodes[id].over_budget = true;
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(self.nodes[id].attractor_candidates.clone())
    }

    /// Attractor seeds of the given node: exactly one state per attractor
    /// whose minimal trap space is this node. See
    /// [SuccessionDiagram::node_attractor_candidates] for the `compute` and
    /// over-budget semantics.
    pub fn node_attractor_seeds(
        &mut self,
        id: NodeId,
        compute: bool,
    ) -> Result<Option<Vec<Space>>, AnalysisError> {
        if self.nodes[id].attractor_seeds.is_none() && compute && !self.nodes[id].over_budget {
            let Some(candidates) = self.node_attractor_candidates(id, true)? else {
                return Ok(None);
            };
            match attractors::prune_candidates(self, id, candidates) {
                Ok(seeds) => {
                    self.nodes[id].attractor_seeds = Some(seeds);
                }
                Err(error) if error.is_recoverable() => {
                    if should_log(self.config.log_level()) {
                        println!("[{}] Candidate pruning failed (recoverable): {}.", id, error);
                    }
                    self.nodes[id].over_budget = true;
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(self.nodes[id].attractor_seeds.clone())
    }

    /// The full symbolic attractor sets of the given node, computed on demand
    /// from the attractor seeds.
    pub fn node_attractor_sets(
        &mut self,
        id: NodeId,
        compute: bool,
    ) -> Result<Option<Vec<VertexSet>>, AnalysisError> {
        if self.nodes[id].attractor_sets.is_none() && compute && !self.nodes[id].over_budget {
            let Some(seeds) = self.node_attractor_seeds(id, true)? else {
                return Ok(None);
            };
            match attractors::compute_attractor_sets(self, id, &seeds) {
                Ok(sets) => {
                    self.nodes[id].attractor_sets = Some(sets);
                }
                Err(error) if error.is_recoverable() => {
                    self.nodes[id].over_budget = true;
                }
                Err(fatal) => return Err(fatal),
            }
        }
        Ok(self.nodes[id].attractor_sets.clone())
    }

    /// Attractor seeds for every expanded node, computed where missing.
    /// Nodes without attractors (or with unknown results) are omitted.
    pub fn expanded_attractor_seeds(
        &mut self,
    ) -> Result<BTreeMap<NodeId, Vec<Space>>, AnalysisError> {
        let mut result = BTreeMap::new();
        let expanded: Vec<NodeId> = self.expanded_ids().collect();
        for id in expanded {
            if let Some(seeds) = self.node_attractor_seeds(id, true)? {
                if !seeds.is_empty() {
                    result.insert(id, seeds);
                }
            }
        }
        Ok(result)
    }

    /// Symbolic attractor sets for every expanded node, computed where missing.
    /// Nodes without attractors (or with unknown results) are omitted.
    pub fn expanded_attractor_sets(
        &mut self,
    ) -> Result<BTreeMap<NodeId, Vec<VertexSet>>, AnalysisError> {
        let mut result = BTreeMap::new();
        let expanded: Vec<NodeId> = self.expanded_ids().collect();
        for id in expanded {
            if let Some(sets) = self.node_attractor_sets(id, true)? {
                if !sets.is_empty() {
                    result.insert(id, sets);
                }
            }
        }
        Ok(result)
    }

    /// A structured overview of the diagram: node count, depth, variable
    /// ordering and the attractor count of every expanded node.
    pub fn summary(&mut self) -> Result<SdSummary, AnalysisError> {
        let seeds = self.expanded_attractor_seeds()?;
        Ok(SdSummary {
            n_nodes: self.len(),
            depth: self.depth(),
            node_ordering: self
                .network
                .variables()
                .map(|it| self.network.get_variable_name(it).clone())
                .collect(),
            attractors_by_node: seeds
                .into_iter()
                .map(|(id, seeds)| (id, seeds.len()))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::succession_diagram::SuccessionDiagram;
    use crate::AnalysisConfig;

    #[test]
    fn summary_of_a_simple_network() {
        let mut config = AnalysisConfig::default();
        config.pint_reachability = false;
        let mut sd = SuccessionDiagram::from_bnet(
            r"
            targets, factors
            A, B
            B, A & C
            C, !A | B
        ",
            config,
        )
        .unwrap();
        assert!(sd.build().unwrap());

        let summary = sd.summary().unwrap();
        assert_eq!(3, summary.n_nodes);
        assert_eq!(1, summary.depth);
        assert_eq!(vec!["A", "B", "C"], summary.node_ordering);

        // Both minimal trap spaces hold one fixed-point attractor; the root
        // holds none.
        assert_eq!(2, summary.attractors_by_node.len());
        assert!(!summary.attractors_by_node.contains_key(&sd.root()));
        assert!(summary.attractors_by_node.values().all(|count| *count == 1));

        let printed = summary.to_string();
        assert!(printed.contains("3 nodes"));
        assert!(printed.contains("State order: A, B, C"));
    }
}
