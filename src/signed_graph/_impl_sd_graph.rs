use crate::signed_graph::Sign::{Negative, Positive};
use crate::signed_graph::SdGraph;
use crate::{RegulatoryGraph, VariableId};
use std::collections::HashSet;

impl SdGraph {
    /// The set of all vertices of this graph.
    pub fn mk_all_vertices(&self) -> HashSet<VariableId> {
        let var_count = self.successors.len();
        (0..var_count).map(VariableId::from_index).collect()
    }

    /// A copy of this graph with positive self-loop edges removed.
    ///
    /// Source variables regulate themselves positively, which is irrelevant for
    /// negative-cycle analysis but inflates the candidate pool of the greedy
    /// feedback-vertex-set search.
    pub fn without_positive_self_loops(&self) -> SdGraph {
        let mut result = self.clone();
        for (index, edges) in result.successors.iter_mut().enumerate() {
            edges.retain(|(x, sign)| !(x.to_index() == index && *sign == Positive));
        }
        for (index, edges) in result.predecessors.iter_mut().enumerate() {
            edges.retain(|(x, sign)| !(x.to_index() == index && *sign == Positive));
        }
        result
    }

    /// **(internal)** Compute the degree of a vertex within the given set.
    pub(crate) fn approx_degree(
        &self,
        vertex: VariableId,
        universe: &HashSet<VariableId>,
    ) -> usize {
        let in_degree = self.predecessors[vertex.to_index()]
            .iter()
            .filter(|(x, _)| universe.contains(x))
            .count();
        let out_degree = self.successors[vertex.to_index()]
            .iter()
            .filter(|(x, _)| universe.contains(x))
            .count();

        in_degree + out_degree
    }
}

impl From<&RegulatoryGraph> for SdGraph {
    fn from(rg: &RegulatoryGraph) -> Self {
        let mut successors = Vec::new();
        let mut predecessors = Vec::new();
        for var in rg.variables() {
            let mut next_step = Vec::new();
            let mut prev_step = Vec::new();

            for target in rg.targets(var) {
                let sign = rg.find_regulation(var, target).unwrap().sign();
                if sign != Some(Positive) {
                    next_step.push((target, Negative));
                }
                if sign != Some(Negative) {
                    next_step.push((target, Positive));
                }
            }

            for regulator in rg.regulators(var) {
                let sign = rg.find_regulation(regulator, var).unwrap().sign();
                if sign != Some(Positive) {
                    prev_step.push((regulator, Negative));
                }
                if sign != Some(Negative) {
                    prev_step.push((regulator, Positive));
                }
            }

            // Variables should be well-ordered, but just in case...
            assert_eq!(var.to_index(), successors.len());

            successors.push(next_step);
            predecessors.push(prev_step);
        }
        SdGraph {
            successors,
            predecessors,
        }
    }
}

#[cfg(test)]
pub mod tests {
    use crate::signed_graph::SdGraph;
    use crate::signed_graph::Sign::{Negative, Positive};
    use crate::RegulatoryGraph;

    /// A test graph with one trivial component (`a`), a negative 2-cycle
    /// (`b_1`, `b_2`), a component with one positive and one negative cycle
    /// (`d_1`, `d_2`, `d_3`) and a positive self-loop (`e`).
    pub fn build_test_regulatory_graph() -> RegulatoryGraph {
        let names = ["a", "b_1", "b_2", "c", "d_1", "d_2", "d_3", "e"];
        let mut rg = RegulatoryGraph::new(names.iter().map(|it| it.to_string()).collect()).unwrap();
        let find = |rg: &RegulatoryGraph, name: &str| rg.find_variable(name).unwrap();
        let edges = [
            ("a", "c", Some(Positive)),
            ("b_1", "b_2", Some(Positive)),
            ("b_2", "b_1", Some(Negative)),
            ("b_2", "c", Some(Positive)),
            ("c", "d_2", Some(Positive)),
            ("c", "e", Some(Positive)),
            ("d_1", "d_3", Some(Positive)),
            ("d_3", "d_2", Some(Negative)),
            ("d_2", "d_1", Some(Positive)),
            ("d_1", "d_2", Some(Positive)),
            ("e", "e", Some(Positive)),
        ];
        for (from, to, sign) in edges {
            let from = find(&rg, from);
            let to = find(&rg, to);
            rg.add_regulation(from, to, sign).unwrap();
        }
        rg
    }

    #[test]
    pub fn basic_sd_graph_test() {
        let rg = build_test_regulatory_graph();
        let sd_graph = SdGraph::from(&rg);
        assert_eq!(sd_graph.successors.len(), rg.num_vars());
        assert_eq!(sd_graph.predecessors.len(), rg.num_vars());

        for regulator in rg.variables() {
            for target in rg.targets(regulator) {
                assert!(sd_graph.successors[regulator.to_index()]
                    .iter()
                    .any(|(it, _)| *it == target));
                assert!(sd_graph.predecessors[target.to_index()]
                    .iter()
                    .any(|(it, _)| *it == regulator));
            }
        }

        assert_eq!(sd_graph.mk_all_vertices(), rg.variables().collect());

        let e = rg.find_variable("e").unwrap();
        let no_loops = sd_graph.without_positive_self_loops();
        assert!(no_loops.successors[e.to_index()].is_empty());
    }
}
