use crate::signed_graph::{SdGraph, Sign};
use crate::VariableId;
use std::collections::{HashSet, VecDeque};

impl SdGraph {
    /// Return the set of vertices forward-reachable from the `initial` set.
    pub fn forward_reachable(&self, initial: HashSet<VariableId>) -> HashSet<VariableId> {
        self.closure(&self.successors, initial, None)
    }

    /// Return the set of vertices backward-reachable from the `initial` set.
    pub fn backward_reachable(&self, initial: HashSet<VariableId>) -> HashSet<VariableId> {
        self.closure(&self.predecessors, initial, None)
    }

    /// Return the set of vertices forward-reachable from the `initial` set within
    /// the `restriction` set.
    pub fn restricted_forward_reachable(
        &self,
        restriction: &HashSet<VariableId>,
        initial: HashSet<VariableId>,
    ) -> HashSet<VariableId> {
        self.closure(&self.successors, initial, Some(restriction))
    }

    /// Return the set of vertices backward-reachable from the `initial` set within
    /// the `restriction` set.
    pub fn restricted_backward_reachable(
        &self,
        restriction: &HashSet<VariableId>,
        initial: HashSet<VariableId>,
    ) -> HashSet<VariableId> {
        self.closure(&self.predecessors, initial, Some(restriction))
    }

    /// **(internal)** Worklist closure of `initial` under the given edge relation,
    /// optionally confined to a `universe` of admissible vertices.
    fn closure(
        &self,
        edges: &[Vec<(VariableId, Sign)>],
        initial: HashSet<VariableId>,
        universe: Option<&HashSet<VariableId>>,
    ) -> HashSet<VariableId> {
        let mut result: HashSet<VariableId> = match universe {
            Some(universe) => initial
                .into_iter()
                .filter(|it| universe.contains(it))
                .collect(),
            None => initial,
        };
        let mut queue: VecDeque<VariableId> = result.iter().cloned().collect();
        while let Some(vertex) = queue.pop_front() {
            for (next, _) in &edges[vertex.to_index()] {
                let admissible = universe.map(|u| u.contains(next)).unwrap_or(true);
                if admissible && result.insert(*next) {
                    queue.push_back(*next);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use crate::signed_graph::_impl_sd_graph::tests::build_test_regulatory_graph;
    use crate::signed_graph::SdGraph;
    use std::collections::HashSet;

    #[test]
    pub fn basic_reachability_test() {
        // See `build_test_regulatory_graph` for a high-level description.
        let rg = build_test_regulatory_graph();

        let a = rg.find_variable("a").unwrap();
        let b_1 = rg.find_variable("b_1").unwrap();
        let b_2 = rg.find_variable("b_2").unwrap();
        let c = rg.find_variable("c").unwrap();
        let d_1 = rg.find_variable("d_1").unwrap();
        let d_2 = rg.find_variable("d_2").unwrap();
        let d_3 = rg.find_variable("d_3").unwrap();
        let e = rg.find_variable("e").unwrap();

        let graph = SdGraph::from(&rg);

        let fwd = graph.forward_reachable(HashSet::from([c]));
        let bwd = graph.backward_reachable(HashSet::from([c]));

        assert_eq!(fwd, HashSet::from([c, d_1, d_2, d_3, e]));
        assert_eq!(bwd, HashSet::from([c, b_1, b_2, a]));

        let restriction = HashSet::from([b_1, b_2, c, e]);

        let fwd = graph.restricted_forward_reachable(&restriction, HashSet::from([b_1, c]));
        let bwd = graph.restricted_backward_reachable(&restriction, HashSet::from([e]));

        assert_eq!(fwd, restriction);
        assert_eq!(bwd, restriction);
    }
}
