use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
use crate::{global_log_level, log_essential, never_stop, should_log, VariableId};

/// Saturation-based reachability within the asynchronous state-transition graph.
///
/// In every iteration, the procedure evaluates the one-step extension of the
/// current set for each variable and commits the one producing the smallest
/// intermediate BDD. The result does not depend on this ordering, only the
/// intermediate sizes do.
pub struct Reachability {
    _dummy: (),
}

impl Reachability {
    /// Compute the set of states forward-reachable from `initial`.
    pub fn reach_fwd(graph: &SymbolicAsyncGraph, initial: &VertexSet) -> VertexSet {
        Self::_reach_fwd(graph, initial, usize::MAX, global_log_level(), &never_stop)
            .unwrap()
            .expect("Unreachable: no budget was set.")
    }

    /// Compute the set of states backward-reachable from `initial`.
    pub fn reach_bwd(graph: &SymbolicAsyncGraph, initial: &VertexSet) -> VertexSet {
        Self::_reach_bwd(graph, initial, usize::MAX, global_log_level(), &never_stop)
            .unwrap()
            .expect("Unreachable: no budget was set.")
    }

    /// A version of [Reachability::reach_fwd] with cancellation, logging and
    /// a BDD size budget. Returns `Ok(None)` when an intermediate result
    /// exceeds `max_bdd_size`.
    pub fn _reach_fwd<E, F: Fn() -> Result<(), E>>(
        graph: &SymbolicAsyncGraph,
        initial: &VertexSet,
        max_bdd_size: usize,
        log_level: usize,
        interrupt: &F,
    ) -> Result<Option<VertexSet>, E> {
        Self::_reach(
            graph,
            initial,
            |g, s, v| g.var_post_out(v, s),
            max_bdd_size,
            log_level,
            interrupt,
        )
    }

    /// A version of [Reachability::reach_bwd] with cancellation, logging and
    /// a BDD size budget. Returns `Ok(None)` when an intermediate result
    /// exceeds `max_bdd_size`.
    pub fn _reach_bwd<E, F: Fn() -> Result<(), E>>(
        graph: &SymbolicAsyncGraph,
        initial: &VertexSet,
        max_bdd_size: usize,
        log_level: usize,
        interrupt: &F,
    ) -> Result<Option<VertexSet>, E> {
        Self::_reach(
            graph,
            initial,
            |g, s, v| g.var_pre_out(v, s),
            max_bdd_size,
            log_level,
            interrupt,
        )
    }

    /// The generic saturation procedure shared by forward and backward
    /// reachability.
    pub fn _reach<E, F, S>(
        graph: &SymbolicAsyncGraph,
        initial: &VertexSet,
        step: S,
        max_bdd_size: usize,
        log_level: usize,
        interrupt: &F,
    ) -> Result<Option<VertexSet>, E>
    where
        F: Fn() -> Result<(), E>,
        S: Fn(&SymbolicAsyncGraph, &VertexSet, VariableId) -> VertexSet,
    {
        if should_log(log_level) {
            println!(
                "Start symbolic reachability with {}[nodes:{}] states.",
                initial.approx_cardinality(),
                initial.symbolic_size()
            );
        }

        let mut result = initial.clone();

        loop {
            // Among all variables with a pending delta, commit the one that
            // produces the smallest extended set.
            let mut best: Option<VertexSet> = None;
            for var in graph.variables().rev() {
                let step_set = step(graph, &result, var);
                interrupt()?;
                if step_set.is_empty() {
                    continue;
                }
                let extended = result.union(&step_set);
                let is_better = match &best {
                    None => true,
                    Some(current) => extended.symbolic_size() < current.symbolic_size(),
                };
                if is_better {
                    best = Some(extended);
                }
            }

            let Some(best) = best else {
                // No variable has a pending delta. Fixed point reached.
                if should_log(log_level) {
                    println!(
                        "Reachability done: {}[nodes:{}] states.",
                        result.approx_cardinality(),
                        result.symbolic_size()
                    );
                }
                return Ok(Some(result));
            };

            result = best;

            if result.symbolic_size() > max_bdd_size {
                if should_log(log_level) {
                    println!(
                        "Reachability exceeded BDD size budget ({} > {}).",
                        result.symbolic_size(),
                        max_bdd_size
                    );
                }
                return Ok(None);
            }

            if log_essential(log_level, result.symbolic_size()) {
                println!(
                    " >> Reach progress: {}[nodes:{}] states.",
                    result.approx_cardinality(),
                    result.symbolic_size(),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::{Reachability, SymbolicAsyncGraph};
    use crate::BooleanNetwork;

    #[test]
    fn reachability_on_a_cycle() {
        // a and b copy each other, so 00 and 11 are fixed points,
        // while 01 and 10 can reach everything.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a
        ",
        )
        .unwrap();
        let stg = SymbolicAsyncGraph::new(&bn);
        let ctx = stg.symbolic_context();

        let fixed = stg.mk_subspace(&ctx.state_to_space(&[false, false]));
        assert_eq!(fixed, Reachability::reach_fwd(&stg, &fixed));

        let osc = stg.mk_subspace(&ctx.state_to_space(&[false, true]));
        let fwd = Reachability::reach_fwd(&stg, &osc);
        assert_eq!(3.0, fwd.approx_cardinality());

        let bwd = Reachability::reach_bwd(&stg, &fixed);
        assert_eq!(3.0, bwd.approx_cardinality());

        // Both fixed points are reachable from the oscillating state, but the
        // other oscillating state is not.
        assert!(fixed.is_subset(&fwd));
        let osc_2 = stg.mk_subspace(&ctx.state_to_space(&[true, false]));
        assert!(!osc_2.is_subset(&fwd));

        // A tiny budget must report an overflow on the growing set.
        let capped =
            Reachability::_reach_fwd::<(), _>(&stg, &osc, 1, crate::LOG_NOTHING, &crate::never_stop)
                .unwrap();
        assert!(capped.is_none());
    }
}
