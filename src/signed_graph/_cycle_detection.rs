use crate::signed_graph::Sign::Positive;
use crate::signed_graph::{SdGraph, Sign};
use crate::VariableId;
use std::collections::{HashMap, HashSet};

impl SdGraph {
    /// Compute the shortest cycle (or one of the shortest cycles) within
    /// `restriction` that also contains the `pivot` vertex. The result is a vector
    /// with pivot at position zero and other vertices in the order in which they
    /// appear on the cycle. If no such cycle exists, returns `None`.
    ///
    /// Panics if `pivot` is not a member of `restriction`. You can restrict the
    /// search to cycles below a specific length by providing the `upper_bound`.
    pub fn shortest_cycle(
        &self,
        restriction: &HashSet<VariableId>,
        pivot: VariableId,
        upper_bound: usize,
    ) -> Option<Vec<VariableId>> {
        assert!(restriction.contains(&pivot));

        // An iterative DFS which remembers the shortest distance from the pivot
        // at which each vertex was visited; paths that cannot improve on the
        // shortest known cycle are pruned.
        let pending = |vertex: VariableId| -> Vec<VariableId> {
            self.successors[vertex.to_index()]
                .iter()
                .map(|(next, _)| *next)
                .filter(|next| restriction.contains(next))
                .collect()
        };

        let mut best_cycle: Option<Vec<VariableId>> = None;
        let mut best_length = usize::MAX;
        let mut shortest_distance: HashMap<VariableId, usize> = HashMap::new();
        shortest_distance.insert(pivot, 0);

        let mut dfs_stack = vec![(pivot, pending(pivot))];

        while let Some((vertex, successors)) = dfs_stack.last_mut() {
            let distance = shortest_distance[vertex];

            if best_length <= distance || upper_bound <= distance {
                dfs_stack.pop();
                continue;
            }

            let Some(next) = successors.pop() else {
                dfs_stack.pop();
                continue;
            };

            if next == pivot {
                // Closed a cycle; the pivot's distance is always zero, so it is
                // handled separately from the relaxation below.
                let cycle: Vec<VariableId> = dfs_stack.iter().map(|(it, _)| *it).collect();
                if cycle.len() < best_length {
                    best_length = cycle.len();
                    best_cycle = Some(cycle);
                }
                continue;
            }

            let known = shortest_distance.get(&next).cloned().unwrap_or(usize::MAX);
            if distance + 1 < known {
                shortest_distance.insert(next, distance + 1);
                dfs_stack.push((next, pending(next)));
            }
            // Otherwise this path cannot improve the distance of `next`.
        }

        best_cycle
    }

    /// Same as [SdGraph::shortest_cycle], but only cycles of the prescribed
    /// `target_parity` are considered.
    ///
    /// Cycle parity is calculated over the monotonicity of its edges (`+` and `-`
    /// is negative, `-` and `-` is positive). Only *simple* cycles are considered:
    /// otherwise, a negative cycle could always be turned into a positive one
    /// by repeating it twice.
    pub fn shortest_parity_cycle(
        &self,
        restriction: &HashSet<VariableId>,
        pivot: VariableId,
        target_parity: Sign,
        upper_bound: usize,
    ) -> Option<Vec<VariableId>> {
        assert!(restriction.contains(&pivot));

        // The search space doubles: each vertex is visited with the parity of
        // the path through which it was discovered.
        let pending = |vertex: VariableId| -> Vec<(VariableId, Sign)> {
            self.successors[vertex.to_index()]
                .iter()
                .filter(|(next, _)| restriction.contains(next))
                .cloned()
                .collect()
        };

        let mut best_cycle: Option<Vec<VariableId>> = None;
        let mut best_length = usize::MAX;
        let mut shortest_distance: HashMap<(VariableId, Sign), usize> = HashMap::new();
        shortest_distance.insert((pivot, Positive), 0);
        shortest_distance.insert((pivot, Sign::Negative), 0);

        let mut dfs_stack = vec![((pivot, Positive), pending(pivot))];

        while let Some((item, successors)) = dfs_stack.last_mut() {
            let distance = shortest_distance[item];

            if best_length <= distance || upper_bound <= distance {
                dfs_stack.pop();
                continue;
            }

            let Some((next, edge_sign)) = successors.pop() else {
                dfs_stack.pop();
                continue;
            };
            let path_parity = item.1 + edge_sign;

            if next == pivot {
                // The pivot's distances are always zero; a closed path counts
                // only when it has the requested parity.
                if path_parity == target_parity {
                    let cycle: Vec<VariableId> =
                        dfs_stack.iter().map(|((it, _), _)| *it).collect();
                    if cycle.len() < best_length {
                        best_length = cycle.len();
                        best_cycle = Some(cycle);
                    }
                }
                continue;
            }

            let known = shortest_distance
                .get(&(next, path_parity))
                .cloned()
                .unwrap_or(usize::MAX);
            if distance + 1 < known {
                // Only simple cycles count, so a vertex that is already on the
                // DFS path must not be entered again under the other parity.
                let is_on_path = dfs_stack.iter().any(|((x, _), _)| *x == next);
                if !is_on_path {
                    shortest_distance.insert((next, path_parity), distance + 1);
                    dfs_stack.push(((next, path_parity), pending(next)));
                }
            }
        }

        best_cycle
    }
}

#[cfg(test)]
mod tests {
    use crate::signed_graph::Sign::{Negative, Positive};
    use crate::signed_graph::{SdGraph, Sign};
    use crate::RegulatoryGraph;

    fn build_cycle_graph(signs: &[(&str, &str, Sign)]) -> RegulatoryGraph {
        let mut names: Vec<String> = signs
            .iter()
            .flat_map(|(a, b, _)| [a.to_string(), b.to_string()])
            .collect();
        names.sort();
        names.dedup();
        let mut rg = RegulatoryGraph::new(names).unwrap();
        for (from, to, sign) in signs {
            let from = rg.find_variable(from).unwrap();
            let to = rg.find_variable(to).unwrap();
            rg.add_regulation(from, to, Some(*sign)).unwrap();
        }
        rg
    }

    #[test]
    pub fn test_cycle_detection() {
        // Scenario: There are two cycles: x1 -> x2 -> x3 -> x4 and x1 -> x5 -> x4.
        // Finally, x6 can reach x1, but is not on a cycle.
        let rg = build_cycle_graph(&[
            ("x_1", "x_2", Positive),
            ("x_2", "x_3", Positive),
            ("x_3", "x_4", Positive),
            ("x_4", "x_1", Positive),
            ("x_1", "x_5", Positive),
            ("x_5", "x_4", Positive),
            ("x_6", "x_1", Positive),
        ]);

        let x_1 = rg.find_variable("x_1").unwrap();
        let x_2 = rg.find_variable("x_2").unwrap();
        let x_3 = rg.find_variable("x_3").unwrap();
        let x_4 = rg.find_variable("x_4").unwrap();
        let x_5 = rg.find_variable("x_5").unwrap();
        let x_6 = rg.find_variable("x_6").unwrap();

        let graph = SdGraph::from(&rg);

        let mut vertices = graph.mk_all_vertices();
        let upper_bound = usize::MAX;

        assert_eq!(
            Some(vec![x_1, x_5, x_4]),
            graph.shortest_cycle(&vertices, x_1, upper_bound)
        );
        assert_eq!(
            Some(vec![x_2, x_3, x_4, x_1]),
            graph.shortest_cycle(&vertices, x_2, upper_bound)
        );
        assert_eq!(None, graph.shortest_cycle(&vertices, x_6, upper_bound));

        vertices.remove(&x_5);

        assert_eq!(
            Some(vec![x_1, x_2, x_3, x_4]),
            graph.shortest_cycle(&vertices, x_1, upper_bound)
        );
    }

    #[test]
    pub fn test_parity_cycle_detection() {
        // Scenario: There are two cycles: x1 -> x2 -| x3 -> x4 -| x1 (positive)
        // and x1 -> x5 -> x4 -| x_1 (negative). Finally, x6 can reach x1, but is
        // not a member of a cycle.
        let rg = build_cycle_graph(&[
            ("x_1", "x_2", Positive),
            ("x_2", "x_3", Negative),
            ("x_3", "x_4", Positive),
            ("x_4", "x_1", Negative),
            ("x_1", "x_5", Positive),
            ("x_5", "x_4", Positive),
            ("x_6", "x_1", Negative),
        ]);

        let x_1 = rg.find_variable("x_1").unwrap();
        let x_2 = rg.find_variable("x_2").unwrap();
        let x_3 = rg.find_variable("x_3").unwrap();
        let x_4 = rg.find_variable("x_4").unwrap();
        let x_5 = rg.find_variable("x_5").unwrap();
        let x_6 = rg.find_variable("x_6").unwrap();

        let graph = SdGraph::from(&rg);

        let mut vertices = graph.mk_all_vertices();
        let upper_bound = usize::MAX;

        assert_eq!(
            Some(vec![x_1, x_2, x_3, x_4]),
            graph.shortest_parity_cycle(&vertices, x_1, Positive, upper_bound)
        );
        assert_eq!(
            Some(vec![x_1, x_5, x_4]),
            graph.shortest_parity_cycle(&vertices, x_1, Negative, upper_bound)
        );
        assert_eq!(
            None,
            graph.shortest_parity_cycle(&vertices, x_5, Positive, upper_bound)
        );
        assert_eq!(
            None,
            graph.shortest_parity_cycle(&vertices, x_6, Negative, upper_bound)
        );

        vertices.remove(&x_5);

        assert_eq!(
            None,
            graph.shortest_parity_cycle(&vertices, x_1, Negative, upper_bound)
        );
    }
}
