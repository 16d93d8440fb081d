//! Permanent target control of a Boolean network based on the structure of its
//! succession diagram.
//!
//! The planner enumerates all root-to-target paths of the (target-expanded)
//! diagram. Every path yields a *succession* of stable motifs; for each motif,
//! the *internal driver sets* are the subsets of its fixings whose percolation
//! (under everything already established) commits the network to the motif.

use crate::succession_diagram::{NodeId, SuccessionDiagram};
use crate::{AnalysisError, Space, VariableId};
use std::collections::HashSet;

/// Determines which driver sets are reported for each succession step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ControlMode {
    /// All subset-minimal internal driver sets (the default).
    AllMinimal,
    /// All driver sets of the smallest achievable size.
    AllMinimum,
    /// A single driver set of the smallest achievable size (fast path).
    AnyMinimum,
}

/// One intervention: a succession of stable motifs leading to the target,
/// together with the alternative driver sets of every step.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Intervention {
    /// The sequence of (reduced) stable motifs, in application order.
    pub succession: Vec<Space>,
    /// For every motif, the list of driver sets that commit to it. An empty
    /// list means no driver set was found for that step.
    pub controls: Vec<Vec<Space>>,
}

impl Intervention {
    /// True when every step of the succession has at least one driver set.
    pub fn is_successful(&self) -> bool {
        self.controls.iter().all(|step| !step.is_empty())
    }

    /// All ways of executing this intervention, each as the union of one driver
    /// set choice per step. Conflicting combinations are dropped (they cannot
    /// arise for nested trap spaces).
    fn driver_unions(&self) -> Vec<Space> {
        if !self.is_successful() {
            return Vec::new();
        }
        let num_vars = self
            .succession
            .first()
            .map(|it| it.num_vars())
            .unwrap_or(0);
        let mut unions = vec![Space::new_raw(num_vars)];
        for step in &self.controls {
            let mut next = Vec::new();
            for partial in &unions {
                for driver in step {
                    if let Some(combined) = partial.intersect(driver) {
                        next.push(combined);
                    }
                }
            }
            unions = next;
        }
        unions
    }
}

impl SuccessionDiagram {
    /// Compute the control interventions that drive every trajectory of the
    /// network into the `target` trap space. The diagram is expanded towards
    /// the target as necessary.
    pub fn succession_control(
        &mut self,
        target: &Space,
        mode: ControlMode,
    ) -> Result<Vec<Intervention>, AnalysisError> {
        let successions = self.successions_to_target(target)?;

        let mut interventions = Vec::new();
        for succession in successions {
            let controls = self.drivers_of_succession(&succession, mode);
            interventions.push(Intervention {
                succession,
                controls,
            });
        }
        Ok(interventions)
    }

    /// The ranked list of driver sets for the given target: each entry is the
    /// union of one driver choice along a root-to-target succession. Sorted by
    /// size, ties broken by the lexicographic order of fixed variables.
    pub fn control(
        &mut self,
        target: &Space,
        mode: ControlMode,
    ) -> Result<Vec<Space>, AnalysisError> {
        let interventions = self.succession_control(target, mode)?;
        let mut result: Vec<Space> = interventions
            .iter()
            .flat_map(|it| it.driver_unions())
            .collect();
        result.sort_by_key(|space| (space.count_fixed(), space.unique_key()));
        result.dedup();
        Ok(result)
    }

    /// Find all successions (sequences of nested stable motifs) that lead from
    /// the root to the `target` trap space.
    pub fn successions_to_target(
        &mut self,
        target: &Space,
    ) -> Result<Vec<Vec<Space>>, AnalysisError> {
        self.expand_to_target(target)?;

        // Nodes that contradict the target, or minimal trap spaces that do not
        // land inside it, must not be reachable from a control end point.
        let mut hot_nodes: HashSet<NodeId> = HashSet::new();
        let mut undecided: Vec<NodeId> = Vec::new();
        for id in self.node_ids() {
            let space = self.node_space(id);
            let consistent = space.intersect(target).is_some();
            let is_goal = space.is_subspace(target);
            if !consistent || (!is_goal && self.node_is_minimal(id)) {
                hot_nodes.insert(id);
            } else if !is_goal {
                undecided.push(id);
            }
        }

        // A consistent non-goal node can still trap trajectories forever in a
        // motif-avoidant attractor of its own, which also disqualifies it as
        // a pass-through node.
        for id in undecided {
            match self.node_attractor_seeds(id, true)? {
                Some(seeds) if seeds.is_empty() => (),
                // Unknown results are treated conservatively.
                _ => {
                    hot_nodes.insert(id);
                }
            }
        }

        let reaches_hot: Vec<bool> = self
            .node_ids()
            .map(|id| self.descendants_intersect(id, &hot_nodes))
            .collect();

        let mut successions = Vec::new();
        for id in self.node_ids() {
            if reaches_hot[id] {
                continue;
            }
            // The node is a valid end point only if some parent can still reach
            // a hot node; otherwise controlling to the parent is sufficient.
            let needed = self.node_parents(id).iter().any(|p| reaches_hot[*p])
                || (id == self.root() && !hot_nodes.contains(&id));
            if !needed && id != self.root() {
                continue;
            }
            for path in self.root_paths(id) {
                let motifs: Vec<Space> = path
                    .windows(2)
                    .map(|edge| self.edge_stable_motif(edge[0], edge[1], true))
                    .collect();
                successions.push(motifs);
            }
        }

        // The trivial succession (the root is already committed to the target)
        // is reported as an empty motif sequence.
        successions.sort_by_key(|it| {
            it.iter().map(|space| space.unique_key()).collect::<Vec<_>>()
        });
        successions.dedup();
        successions.sort_by_key(|it| it.len());
        Ok(successions)
    }

    /// **(internal)** True if the descendant closure of `id` (including `id`)
    /// intersects the given node set.
    fn descendants_intersect(&self, id: NodeId, set: &HashSet<NodeId>) -> bool {
        let mut stack = vec![id];
        let mut seen = HashSet::from([id]);
        while let Some(node) = stack.pop() {
            if set.contains(&node) {
                return true;
            }
            if let Some(children) = self.node_children(node) {
                for child in children {
                    if seen.insert(*child) {
                        stack.push(*child);
                    }
                }
            }
        }
        false
    }

    /// **(internal)** All simple paths from the root to the given node.
    fn root_paths(&self, id: NodeId) -> Vec<Vec<NodeId>> {
        if id == self.root() {
            return vec![vec![id]];
        }
        let mut result = Vec::new();
        for parent in self.node_parents(id) {
            for mut path in self.root_paths(*parent) {
                path.push(id);
                result.push(path);
            }
        }
        result
    }

    /// Find the driver sets of a list of sequentially nested stable motifs.
    /// Values established by earlier steps (including their percolation) are
    /// assumed fixed for the later steps.
    pub fn drivers_of_succession(
        &self,
        succession: &[Space],
        mode: ControlMode,
    ) -> Vec<Vec<Space>> {
        let num_vars = self.network.num_vars();
        let mut control_strategies = Vec::new();
        let mut assume_fixed = Space::new_raw(num_vars);
        for motif in succession {
            control_strategies.push(self.find_drivers(motif, &assume_fixed, mode));
            let established = motif
                .intersect(&assume_fixed)
                .expect("Nested stable motifs cannot conflict.");
            assume_fixed = self.graph.percolate_space(&established);
        }
        control_strategies
    }

    /// Find the internal driver sets of a single target trap space: subsets of
    /// the target's fixings whose percolation (under `assume_fixed`) covers the
    /// whole target.
    pub fn find_drivers(
        &self,
        target_motif: &Space,
        assume_fixed: &Space,
        mode: ControlMode,
    ) -> Vec<Space> {
        // Only the fixings not yet established need driving.
        let pool: Vec<(VariableId, bool)> = target_motif
            .to_values()
            .into_iter()
            .filter(|(var, _)| assume_fixed[*var].is_any())
            .collect();

        let mut drivers: Vec<Space> = Vec::new();
        for size in 0..=pool.len() {
            if !drivers.is_empty() && mode != ControlMode::AllMinimal {
                // The smallest size has been found.
                break;
            }
            for combination in combinations(&pool, size) {
                let driver = Space::from_values(self.network.num_vars(), &combination);
                if drivers.iter().any(|found| driver.is_subspace(found)) {
                    // A subset of this driver set already works.
                    continue;
                }
                let driven = driver
                    .intersect(assume_fixed)
                    .expect("Drivers only fix free variables.");
                let percolated = self.graph.percolate_space(&driven);
                if target_motif
                    .to_values()
                    .into_iter()
                    .all(|(var, value)| percolated[var].try_as_bool() == Some(value))
                {
                    drivers.push(driver);
                    if mode == ControlMode::AnyMinimum {
                        return drivers;
                    }
                }
            }
        }
        drivers
    }
}

/// **(internal)** All `size`-element combinations of the given items, in
/// lexicographic order.
fn combinations<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    if size == 0 {
        return vec![Vec::new()];
    }
    if items.len() < size {
        return Vec::new();
    }
    let mut result = Vec::new();
    for (index, item) in items.iter().enumerate() {
        for mut tail in combinations(&items[(index + 1)..], size - 1) {
            tail.insert(0, item.clone());
            result.push(tail);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use crate::control::ControlMode;
    use crate::succession_diagram::SuccessionDiagram;
    use crate::{AnalysisConfig, ExtendedBoolean, Space};

    #[test]
    fn minimum_driver_of_conjunctive_loop() {
        // One minimal trap space {A=B=C=1}; fixing C=1 percolates into it.
        let mut sd = SuccessionDiagram::from_bnet(
            r"
            targets, factors
            A, (!A & !B) | C
            B, (!A & !B) | C
            C, A & B
        ",
            AnalysisConfig::default(),
        )
        .unwrap();

        let network = sd.as_network().clone();
        let a = network.as_graph().find_variable("A").unwrap();
        let b = network.as_graph().find_variable("B").unwrap();
        let c = network.as_graph().find_variable("C").unwrap();

        let mut target = Space::new(&network);
        target[a] = ExtendedBoolean::One;
        target[b] = ExtendedBoolean::One;
        target[c] = ExtendedBoolean::One;

        let ranked = sd.control(&target, ControlMode::AllMinimal).unwrap();
        assert!(!ranked.is_empty());

        // The minimum driver set is {C = 1}.
        let minimum = &ranked[0];
        assert_eq!(1, minimum.count_fixed());
        assert_eq!(ExtendedBoolean::One, minimum[c]);

        // {A = 1, B = 1} is the other minimal driver set.
        assert!(ranked.iter().any(|d| {
            d.count_fixed() == 2
                && d[a] == ExtendedBoolean::One
                && d[b] == ExtendedBoolean::One
        }));

        // The fast path agrees on the minimum.
        let fast = sd.control(&target, ControlMode::AnyMinimum).unwrap();
        assert_eq!(minimum, &fast[0]);
    }

    #[test]
    fn control_of_a_source_choice() {
        // The target requires the source `s` to be driven to 0.
        let mut sd = SuccessionDiagram::from_bnet(
            r"
            targets, factors
            s, s
            x, s | x
        ",
            AnalysisConfig::default(),
        )
        .unwrap();

        let network = sd.as_network().clone();
        let s = network.as_graph().find_variable("s").unwrap();
        let x = network.as_graph().find_variable("x").unwrap();

        let mut target = Space::new(&network);
        target[s] = ExtendedBoolean::Zero;
        target[x] = ExtendedBoolean::Zero;

        let ranked = sd.control(&target, ControlMode::AllMinimal).unwrap();
        assert!(!ranked.is_empty());
        let best = &ranked[0];
        // Driving s=0 alone is not enough (x may already be 1), so the minimum
        // driver fixes both s and x.
        assert_eq!(2, best.count_fixed());
        assert_eq!(ExtendedBoolean::Zero, best[s]);
        assert_eq!(ExtendedBoolean::Zero, best[x]);
    }
}
