use crate::signed_graph::{SdGraph, Sign};
use crate::VariableId;
use std::collections::HashSet;

impl SdGraph {
    /// Find all non-trivial strongly connected components of this `SdGraph`.
    ///
    /// The result is sorted by component size.
    pub fn strongly_connected_components(&self) -> Vec<HashSet<VariableId>> {
        self.restricted_strongly_connected_components(&self.mk_all_vertices())
    }

    /// Find all non-trivial strongly connected components in the given
    /// `restriction` of this `SdGraph`.
    ///
    /// The result is sorted by component size. The implementation is a simple
    /// iterative forward/backward decomposition which is quadratic in the worst
    /// case, but entirely sufficient for influence graphs of realistic networks.
    pub fn restricted_strongly_connected_components(
        &self,
        restriction: &HashSet<VariableId>,
    ) -> Vec<HashSet<VariableId>> {
        let mut results: Vec<HashSet<VariableId>> = Vec::new();
        let mut worklist = vec![restriction.clone()];

        while let Some(mut universe) = worklist.pop() {
            self.prune_acyclic(&self.successors, &mut universe);
            self.prune_acyclic(&self.predecessors, &mut universe);

            if universe.is_empty() {
                continue;
            }

            // The smallest remaining id, to keep the decomposition deterministic.
            let pivot = universe.iter().min().cloned().unwrap();

            let fwd = self.restricted_forward_reachable(&universe, HashSet::from([pivot]));
            let bwd = self.restricted_backward_reachable(&universe, HashSet::from([pivot]));

            let component: HashSet<VariableId> = fwd.intersection(&bwd).cloned().collect();

            let has_loop = component.len() > 1
                || self.successors[pivot.to_index()]
                    .iter()
                    .any(|(x, _)| *x == pivot);
            if has_loop {
                results.push(component.clone());
            }

            // The rest of the universe splits into three independent parts.
            let rest: HashSet<VariableId> = universe
                .iter()
                .filter(|it| !fwd.contains(it) && !bwd.contains(it))
                .cloned()
                .collect();
            let fwd_only: HashSet<VariableId> =
                fwd.into_iter().filter(|it| !component.contains(it)).collect();
            let bwd_only: HashSet<VariableId> =
                bwd.into_iter().filter(|it| !component.contains(it)).collect();

            for part in [rest, fwd_only, bwd_only] {
                if !part.is_empty() {
                    worklist.push(part);
                }
            }
        }

        results.sort_by_key(|it| {
            // Size first, smallest member second, so that equally sized
            // components are reported deterministically.
            let smallest = it.iter().min().cloned().unwrap();
            (it.len(), smallest)
        });
        results
    }

    /// **(internal)** Iteratively remove vertices that have no edge of the given
    /// relation inside `set`; such vertices cannot lie on a cycle.
    fn prune_acyclic(&self, edges: &[Vec<(VariableId, Sign)>], set: &mut HashSet<VariableId>) {
        let mut changed = true;
        while changed {
            changed = false;
            for vertex in set.clone() {
                let on_cycle = edges[vertex.to_index()]
                    .iter()
                    .any(|(x, _)| set.contains(x));
                if !on_cycle {
                    set.remove(&vertex);
                    changed = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::signed_graph::_impl_sd_graph::tests::build_test_regulatory_graph;
    use crate::signed_graph::SdGraph;
    use std::collections::HashSet;

    #[test]
    pub fn test_scc_decomposition() {
        // See `build_test_regulatory_graph` for a high-level description.
        let rg = build_test_regulatory_graph();

        let _a = rg.find_variable("a").unwrap(); // 'a' is a trivial component.
        let b_1 = rg.find_variable("b_1").unwrap();
        let b_2 = rg.find_variable("b_2").unwrap();
        let c = rg.find_variable("c").unwrap();
        let d_1 = rg.find_variable("d_1").unwrap();
        let d_2 = rg.find_variable("d_2").unwrap();
        let d_3 = rg.find_variable("d_3").unwrap();
        let e = rg.find_variable("e").unwrap();

        let graph = SdGraph::from(&rg);

        let scc = graph.strongly_connected_components();
        assert_eq!(scc.len(), 3);
        assert_eq!(scc[0], HashSet::from([e]));
        assert_eq!(scc[1], HashSet::from([b_1, b_2]));
        assert_eq!(scc[2], HashSet::from([d_1, d_2, d_3]));

        let scc =
            graph.restricted_strongly_connected_components(&HashSet::from([d_1, d_2, c, b_1, e]));
        assert_eq!(scc.len(), 2);
        assert_eq!(scc[0], HashSet::from([e]));
        assert_eq!(scc[1], HashSet::from([d_1, d_2]));
    }
}
