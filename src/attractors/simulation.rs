use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
use crate::{should_log, Space};
use biodivine_lib_bdd::{Bdd, BddValuation};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// A fast but incomplete method for eliminating spurious attractor candidates
/// based on randomised cooperative simulation.
///
/// Each candidate performs up to `max_steps` rounds of asynchronous updates in
/// a freshly shuffled variable order. A candidate is pruned when its walk
/// enters the `avoid` set (it escapes the terminal restriction space) or
/// reaches another still-active candidate (that candidate then represents the
/// shared attractor, if any). Surviving candidates are replaced by the final
/// state of their walk, which tends to be "deeper" towards the attractor.
///
/// When `avoid` is empty, the node is pseudo-minimal and a different, round-based
/// variant is used which can stop at a single representative.
pub(crate) fn prune(
    graph: &SymbolicAsyncGraph,
    candidates: Vec<Space>,
    avoid: &VertexSet,
    max_steps: usize,
    rng: &mut StdRng,
    log_level: usize,
) -> Vec<Space> {
    if candidates.len() <= 1 {
        return candidates;
    }

    if should_log(log_level) {
        println!(
            "Start simulation pruning with {} candidate(s) and {} step(s).",
            candidates.len(),
            max_steps
        );
    }

    let context = graph.symbolic_context();
    let mut variables: Vec<_> = graph.variables().collect();

    let mut candidates_bdd = candidates
        .iter()
        .fold(context.mk_constant(false), |acc, it| {
            acc.or(&context.mk_space(it))
        });

    if !avoid.is_empty() {
        let mut filtered: Vec<Space> = Vec::new();
        for (index, state) in candidates.iter().enumerate() {
            if should_log(log_level) && index % 100 == 99 {
                println!(" > Simulation progress: {}/{}.", index + 1, candidates.len());
            }

            // Remove the state from the candidates. If we cannot rule it out,
            // the walked state is put back below.
            let state_bdd = context.mk_space(state);
            candidates_bdd = candidates_bdd.and_not(&state_bdd);

            let mut simulation = state_bdd.sat_witness().unwrap();

            let mut is_valid_candidate = true;
            for _ in 0..max_steps {
                // Advance all variables by one step in random order.
                variables.shuffle(rng);
                for var in &variables {
                    let step = graph.get_fn_update_bdd(*var).eval_in(&simulation);
                    simulation.set_value(context.get_state_variable(*var), step);
                }

                if candidates_bdd.eval_in(&simulation) {
                    // The walk reached another candidate; that candidate keeps
                    // representing any attractor the two share.
                    is_valid_candidate = false;
                    break;
                }
                if avoid.as_bdd().eval_in(&simulation) {
                    // The walk left the terminal restriction space.
                    is_valid_candidate = false;
                    break;
                }
            }

            if is_valid_candidate {
                candidates_bdd = candidates_bdd.or(&Bdd::from(simulation.clone()));
                filtered.push(valuation_to_space(graph, &simulation));
            }
        }
        filtered
    } else {
        // The avoid set is empty, so this is a pseudo-minimal space: we don't
        // have to watch for escapes, and one representative is enough.
        for _ in 0..max_steps {
            variables.shuffle(rng);
            let mut new_candidates_bdd = context.mk_constant(false);

            let states: Vec<BddValuation> = candidates_bdd.sat_valuations().collect();
            for state in states {
                candidates_bdd = candidates_bdd.and_not(&Bdd::from(state.clone()));

                let mut simulation = state;
                for var in &variables {
                    let step = graph.get_fn_update_bdd(*var).eval_in(&simulation);
                    simulation.set_value(context.get_state_variable(*var), step);
                }

                if candidates_bdd.eval_in(&simulation) || new_candidates_bdd.eval_in(&simulation) {
                    // Merged with one of the other candidates.
                    continue;
                }
                new_candidates_bdd = new_candidates_bdd.or(&Bdd::from(simulation));
            }

            candidates_bdd = new_candidates_bdd;
            if candidates_bdd.cardinality() <= 1.0 {
                break;
            }
        }

        candidates_bdd
            .sat_valuations()
            .map(|valuation| valuation_to_space(graph, &valuation))
            .collect()
    }
}

fn valuation_to_space(graph: &SymbolicAsyncGraph, valuation: &BddValuation) -> Space {
    let context = graph.symbolic_context();
    let state = context.valuation_to_state(valuation);
    context.state_to_space(&state)
}

#[cfg(test)]
mod tests {
    use crate::attractors::simulation::prune;
    use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
    use crate::{BooleanNetwork, LOG_NOTHING};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn simulation_merges_oscillating_candidates() {
        // A single negative cycle: every state is in the one attractor, so any
        // two candidates must merge into one.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, !b
            b, a
        ",
        )
        .unwrap();
        let graph = SymbolicAsyncGraph::new(&bn);
        let ctx = graph.symbolic_context();

        let candidates = vec![
            ctx.state_to_space(&[false, false]),
            ctx.state_to_space(&[true, true]),
        ];
        let avoid = VertexSet::empty(ctx);
        let mut rng = StdRng::seed_from_u64(1);
        let pruned = prune(&graph, candidates, &avoid, 64, &mut rng, LOG_NOTHING);
        assert_eq!(1, pruned.len());
    }

    #[test]
    fn simulation_detects_escape_into_child_space() {
        // `a` can only increase; the candidate at a=0 escapes into the
        // child trap space a=1.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, a | b
            b, !b & a | b & a
        ",
        )
        .unwrap();
        let graph = SymbolicAsyncGraph::new(&bn);
        let ctx = graph.symbolic_context();

        let a = bn.as_graph().find_variable("a").unwrap();
        let mut child = crate::Space::new(&bn);
        child[a] = crate::ExtendedBoolean::One;
        let avoid = graph.mk_subspace(&child);

        let candidates = vec![ctx.state_to_space(&[false, true])];
        let mut rng = StdRng::seed_from_u64(1);
        let pruned = prune(&graph, candidates, &avoid, 64, &mut rng, LOG_NOTHING);
        // A single candidate is never simulated; with two candidates,
        // the escaping one is pruned.
        assert_eq!(1, pruned.len());

        let candidates = vec![
            ctx.state_to_space(&[false, true]),
            ctx.state_to_space(&[false, false]),
        ];
        let mut rng = StdRng::seed_from_u64(1);
        let pruned = prune(&graph, candidates, &avoid, 64, &mut rng, LOG_NOTHING);
        // a=0,b=1 steps into a=1 (avoid) and a=0,b=0 is a fixed point seed.
        assert_eq!(1, pruned.len());
    }
}
