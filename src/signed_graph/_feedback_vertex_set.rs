use crate::signed_graph::{SdGraph, Sign};
use crate::VariableId;
use std::collections::{HashMap, HashSet};

impl SdGraph {
    /// A utility function that prunes the `candidates` set to a smaller subset that
    /// is still guaranteed to be a valid FVS with respect to the specified cycle
    /// detection function.
    ///
    /// This is not the complete FVS approximation algorithm, but it is used multiple
    /// times, so we abstract it into this helper method.
    fn _fvs_helper<F: Fn(&HashSet<VariableId>, VariableId) -> Option<Vec<VariableId>>>(
        &self,
        subgraph: &mut HashSet<VariableId>,
        mut candidates: HashSet<VariableId>,
        compute_cycle: F,
    ) -> HashSet<VariableId> {
        let mut result = HashSet::new();

        // The shortest known cycle in the current `subgraph` for the given `pivot`.
        let mut shortest_cycle_for_pivot: HashMap<VariableId, Vec<VariableId>> = HashMap::new();

        while !candidates.is_empty() {
            // Ensure determinism.
            let mut iterable = Vec::from_iter(candidates.clone());
            iterable.sort();

            let mut best = (VariableId::from_index(0), usize::MAX, 0);
            for vertex in iterable {
                let cycle = if let Some(known_cycle) = shortest_cycle_for_pivot.get(&vertex) {
                    known_cycle
                } else if let Some(computed_cycle) = compute_cycle(subgraph, vertex) {
                    shortest_cycle_for_pivot
                        .entry(vertex)
                        .or_insert(computed_cycle)
                } else {
                    subgraph.remove(&vertex);
                    candidates.remove(&vertex);
                    continue;
                };

                let degree = self.approx_degree(vertex, subgraph);
                if cycle.len() < best.1 || (cycle.len() == best.1 && degree > best.2) {
                    best = (vertex, cycle.len(), degree);
                }
                if cycle.len() == 1 {
                    // Self-loops are always optimal.
                    break;
                }
            }

            if best.1 == usize::MAX {
                // The remaining graph is acyclic!
                return result;
            }

            result.insert(best.0);
            subgraph.remove(&best.0);
            candidates.remove(&best.0);

            shortest_cycle_for_pivot.retain(|_k, v| !v.contains(&best.0));
        }

        result
    }

    /// Compute a feedback vertex set of the subgraph induced by the vertices in the
    /// given `restriction` set.
    ///
    /// A feedback vertex set is a set of vertices such that when these vertices are
    /// removed, the resulting graph is acyclic.
    ///
    /// The algorithm attempts to minimize the size of the resulting FVS, but the
    /// result is not guaranteed to be minimal, as the minimum FVS problem
    /// is NP complete. It works by greedily picking vertices from the shortest
    /// cycles, prioritising vertices with the highest overall degree.
    pub fn restricted_feedback_vertex_set(
        &self,
        restriction: &HashSet<VariableId>,
    ) -> HashSet<VariableId> {
        let candidates = restriction.clone();

        // We prune the candidates twice: the first pass removes most of the
        // uninteresting vertices, the second pass then optimizes the result such
        // that it is (usually) at least subset minimal. The minimality is still
        // not guaranteed though.

        let candidates = self._fvs_helper(&mut restriction.clone(), candidates, |g, x| {
            self.shortest_cycle(g, x, usize::MAX)
        });

        self._fvs_helper(&mut restriction.clone(), candidates, |g, x| {
            self.shortest_cycle(g, x, usize::MAX)
        })
    }

    /// Compute a *negative* feedback vertex set within the subgraph induced by the
    /// vertices in `restriction`: a set of vertices such that when removed, the
    /// graph has no negative cycles.
    ///
    /// Positive self-loops are ignored by the search. The result is deterministic
    /// for a fixed input, but minimality is only best-effort (see
    /// [SdGraph::restricted_feedback_vertex_set]).
    pub fn restricted_negative_feedback_vertex_set(
        &self,
        restriction: &HashSet<VariableId>,
    ) -> HashSet<VariableId> {
        let graph = self.without_positive_self_loops();

        // We first search within a subset of a known FVS. FVS detection is a bit
        // faster and usually gives a reasonable starting point.
        let candidates = graph.restricted_feedback_vertex_set(restriction);

        // The same as the normal FVS method, but uses parity cycle detection.
        // We don't repeat the pruning pass, because in most cases it is not needed.
        graph._fvs_helper(&mut restriction.clone(), candidates, |g, x| {
            graph.shortest_parity_cycle(g, x, Sign::Negative, usize::MAX)
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::signed_graph::_impl_sd_graph::tests::build_test_regulatory_graph;
    use crate::signed_graph::SdGraph;

    #[test]
    pub fn test_feedback_vertex_set() {
        // The test graph has a negative cycle between `b_1` and `b_2`, the
        // `d`-component has both one positive and one negative cycle, and `e`
        // has a positive self-loop.
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

        let vertices = graph.mk_all_vertices();
        let fvs = graph.restricted_feedback_vertex_set(&vertices);
        let n_fvs = graph.restricted_negative_feedback_vertex_set(&vertices);

        assert!(!(fvs.contains(&a) || n_fvs.contains(&a)));
        assert!(!(fvs.contains(&c) || n_fvs.contains(&c)));

        assert_eq!(fvs.len(), 3);
        assert_eq!(n_fvs.len(), 2);

        // `e` has only a positive self-loop, hence it can never appear
        // in the negative FVS.
        assert!(fvs.contains(&e));
        assert!(!n_fvs.contains(&e));

        assert!(fvs.contains(&b_1) || fvs.contains(&b_2));
        assert!(n_fvs.contains(&b_1) || n_fvs.contains(&b_2));

        // `d_3` sits on the negative `d`-cycle but not the positive one.
        assert!(fvs.contains(&d_1) || fvs.contains(&d_2));
        assert!(n_fvs.contains(&d_1) || n_fvs.contains(&d_2) || n_fvs.contains(&d_3));

        // Determinism: repeated runs give the same result.
        assert_eq!(n_fvs, graph.restricted_negative_feedback_vertex_set(&vertices));
    }
}
