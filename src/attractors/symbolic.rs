use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
use crate::{log_essential, AnalysisError, Space};

/// Certify a candidate state by symbolic reachability.
///
/// Returns `Ok(Some(closure))` when the forward closure of `state` does not
/// intersect the `avoid` set; the closure is then exactly the attractor seeded
/// by `state`. Returns `Ok(None)` when the candidate can reach `avoid` (another
/// candidate, a child trap space, or a previously confirmed attractor) and is
/// therefore not an attractor representative.
///
/// Both the forward set and the avoid set are saturated one variable step at a
/// time, always committing the step with the smallest symbolic size; growing
/// the avoid set backwards lets the search terminate early on long escape
/// paths. Exceeding `max_bdd_size` aborts with a recoverable budget error.
pub(crate) fn attractor_closure<F: Fn() -> Result<(), AnalysisError>>(
    graph: &SymbolicAsyncGraph,
    state: &Space,
    avoid: &VertexSet,
    max_bdd_size: usize,
    log_level: usize,
    interrupt: &F,
) -> Result<Option<VertexSet>, AnalysisError> {
    let mut reach = graph.mk_subspace(state);
    let mut avoid = avoid.clone();

    loop {
        interrupt()?;

        if !avoid.intersect(&reach).is_empty() {
            return Ok(None);
        }

        // One forward step of the reach set, one backward step of the avoid
        // set, each picking the variable with the smallest resulting BDD.
        let mut fwd_best: Option<VertexSet> = None;
        let mut bwd_best: Option<VertexSet> = None;
        for var in graph.variables().rev() {
            let fwd_step = graph.var_post_out(var, &reach);
            if !fwd_step.is_empty() {
                let extended = reach.union(&fwd_step);
                let better = fwd_best
                    .as_ref()
                    .map(|best| extended.symbolic_size() < best.symbolic_size())
                    .unwrap_or(true);
                if better {
                    fwd_best = Some(extended);
                }
            }
            if !avoid.is_empty() {
                let bwd_step = graph.var_pre_out(var, &avoid);
                if !bwd_step.is_empty() {
                    let extended = avoid.union(&bwd_step);
                    let better = bwd_best
                        .as_ref()
                        .map(|best| extended.symbolic_size() < best.symbolic_size())
                        .unwrap_or(true);
                    if better {
                        bwd_best = Some(extended);
                    }
                }
            }
            interrupt()?;
        }

        if fwd_best.is_none() {
            // The reach set is forward-closed and disjoint from the avoid set:
            // it is exactly the attractor containing the candidate.
            return Ok(Some(reach));
        }

        if let Some(fwd) = fwd_best {
            reach = fwd;
        }
        if let Some(bwd) = bwd_best {
            avoid = bwd;
        }

        if reach.symbolic_size() > max_bdd_size || avoid.symbolic_size() > max_bdd_size {
            return Err(AnalysisError::BudgetExceeded {
                what: "symbolic reachability certification".to_string(),
                limit: max_bdd_size,
            });
        }

        if log_essential(log_level, reach.symbolic_size() + avoid.symbolic_size()) {
            println!(
                " > Certification progress: reach {}[nodes:{}], avoid {}[nodes:{}].",
                reach.approx_cardinality(),
                reach.symbolic_size(),
                avoid.approx_cardinality(),
                avoid.symbolic_size(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::attractors::symbolic::attractor_closure;
    use crate::config::op_interrupt;
    use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
    use crate::{BooleanNetwork, LOG_NOTHING};

    #[test]
    fn certify_fixed_point_and_reject_transient() {
        // 00 and 11 are fixed points; 01 and 10 are transient.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a
        ",
        )
        .unwrap();
        let graph = SymbolicAsyncGraph::new(&bn);
        let ctx = graph.symbolic_context();
        let interrupt = op_interrupt("test", None);

        let zero = ctx.state_to_space(&[false, false]);
        let one = ctx.state_to_space(&[true, true]);
        let transient = ctx.state_to_space(&[false, true]);

        // The fixed point is its own closure when nothing else is avoided.
        let avoid = VertexSet::empty(ctx);
        let closure =
            attractor_closure(&graph, &zero, &avoid, usize::MAX, LOG_NOTHING, &interrupt)
                .unwrap()
                .unwrap();
        assert_eq!(1.0, closure.approx_cardinality());

        // A transient state reaching an avoided fixed point is rejected.
        let avoid = graph.mk_subspace(&one);
        let verdict =
            attractor_closure(&graph, &transient, &avoid, usize::MAX, LOG_NOTHING, &interrupt)
                .unwrap();
        assert!(verdict.is_none());
    }

    #[test]
    fn closure_of_cyclic_attractor() {
        // One negative cycle: the whole 4-state space is a single attractor.
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
        let interrupt = op_interrupt("test", None);

        let pivot = ctx.state_to_space(&[false, false]);
        let avoid = VertexSet::empty(ctx);
        let closure =
            attractor_closure(&graph, &pivot, &avoid, usize::MAX, LOG_NOTHING, &interrupt)
                .unwrap()
                .unwrap();
        assert_eq!(4.0, closure.approx_cardinality());
    }
}
