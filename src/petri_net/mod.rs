//! Translation of a Boolean network into an implicant Petri-net encoding.
//!
//! Every encoded variable `v` owns two implicit places `(v, 0)` and `(v, 1)`,
//! of which exactly one is marked in any reachable marking (the marking is
//! then in bijection with a network state). A transition moves the token of
//! one variable between its two places, guarded by read arcs on the places of
//! other variables. Update functions are encoded per-implicant (in DNF), so
//! every guard is a conjunction.
//!
//! The net is the input of the trap-space oracle (see [crate::trap_spaces])
//! and of the external unfolding reachability tool
//! (see [PetriNet::to_automata_network]).

use crate::symbolic::SymbolicAsyncGraph;
use crate::{BooleanNetwork, Space, VariableId};
use biodivine_lib_bdd::{Bdd, BddPartialValuation};

/// One Petri-net transition: `variable` flips from `!value` to `value`, provided
/// every `(variable, value)` pair in `conditions` holds in the current marking.
///
/// The implicit source place `(variable, !value)` is not part of `conditions`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PnTransition {
    pub variable: VariableId,
    pub value: bool,
    pub conditions: Vec<(VariableId, bool)>,
}

/// An implicant Petri-net encoding of (a sub-space of) a Boolean network.
#[derive(Clone, Debug)]
pub struct PetriNet {
    /// The variables encoded by places of this net (free variables of the
    /// encoded space), sorted by id.
    variables: Vec<VariableId>,
    transitions: Vec<PnTransition>,
}

impl PetriNet {
    /// Encode the entire state space of the given symbolic graph.
    pub fn new(graph: &SymbolicAsyncGraph) -> PetriNet {
        Self::for_space(graph, &Space::new_raw(graph.num_vars()))
    }

    /// Encode the dynamics of the given graph restricted to `space`: only free
    /// variables obtain places, and all transition guards are simplified under
    /// the fixed values.
    pub fn for_space(graph: &SymbolicAsyncGraph, space: &Space) -> PetriNet {
        let context = graph.symbolic_context();
        let fixings = context.space_fixings(space);

        let mut transitions = Vec::new();
        for var in space.free_variables() {
            let fn_bdd = graph.get_fn_update_bdd(var).restrict(&fixings);
            let var_bdd = context.mk_state_variable_is_true(var);

            let up_bdd = fn_bdd.and(&var_bdd.not());
            let down_bdd = fn_bdd.not().and(&var_bdd);

            Self::push_transitions(context, &mut transitions, var, true, &up_bdd);
            Self::push_transitions(context, &mut transitions, var, false, &down_bdd);
        }

        PetriNet {
            variables: space.free_variables(),
            transitions,
        }
    }

    /// **(internal)** Create one transition per implicant of the enabling
    /// condition `implicants` (a set of states in which `variable` can step
    /// towards `value`).
    fn push_transitions(
        context: &crate::symbolic::SymbolicContext,
        transitions: &mut Vec<PnTransition>,
        variable: VariableId,
        value: bool,
        implicants: &Bdd,
    ) {
        for implicant in optimized_dnf(implicants) {
            let mut conditions = Vec::new();
            for (bdd_var, condition_value) in implicant.to_values() {
                let condition_var = context.find_state_variable(bdd_var).unwrap();
                if condition_var == variable {
                    // The token movement between the variable's own places
                    // is implicit.
                    continue;
                }
                conditions.push((condition_var, condition_value));
            }
            conditions.sort();
            transitions.push(PnTransition {
                variable,
                value,
                conditions,
            });
        }
    }

    /// The variables encoded by this net.
    pub fn variables(&self) -> &[VariableId] {
        &self.variables
    }

    /// The transitions of this net.
    pub fn transitions(&self) -> &[PnTransition] {
        &self.transitions
    }

    /// Create a copy of this net restricted to the given sub-space.
    ///
    /// The places of fixed variables are removed together with every transition
    /// that either modifies a fixed variable or requires the negation of a fixed
    /// value; the satisfied read arcs are stripped from the remaining guards.
    /// No percolation is performed beyond that.
    pub fn restrict(&self, space: &Space) -> PetriNet {
        let variables: Vec<VariableId> = self
            .variables
            .iter()
            .cloned()
            .filter(|var| space[*var].is_any())
            .collect();
        let mut transitions = Vec::new();
        'transitions: for transition in &self.transitions {
            if space[transition.variable].is_fixed() {
                continue;
            }
            let mut conditions = Vec::new();
            for (var, value) in &transition.conditions {
                match space[*var].try_as_bool() {
                    Some(fixed) if fixed == *value => {
                        // The condition is satisfied by the space; drop it.
                    }
                    Some(_) => {
                        // The condition can never hold; drop the transition.
                        continue 'transitions;
                    }
                    None => conditions.push((*var, *value)),
                }
            }
            transitions.push(PnTransition {
                variable: transition.variable,
                value: transition.value,
                conditions,
            });
        }
        PetriNet {
            variables,
            transitions,
        }
    }

    /// Create a copy of this net in which the given variables can only update
    /// *towards* their retained value: the transitions moving a retained
    /// variable away from its value are deleted.
    ///
    /// Fixed points of the modified net cover all attractors of the original
    /// dynamics (the NFVS theorem), which is the basis of attractor candidate
    /// generation.
    pub fn reduce_to_retained_set(&self, retained: &[(VariableId, bool)]) -> PetriNet {
        let mut result = self.clone();
        result.transitions.retain(|transition| {
            !retained
                .iter()
                .any(|(var, value)| transition.variable == *var && transition.value != *value)
        });
        result
    }

    /// Variables of this net that no transition modifies. These are the "source"
    /// variables of the encoded dynamics: their value is an immutable choice.
    pub fn source_variables(&self) -> Vec<VariableId> {
        self.variables
            .iter()
            .cloned()
            .filter(|var| !self.transitions.iter().any(|t| t.variable == *var))
            .collect()
    }

    /// Export this net as an automata-network (`.an`) model accepted by the
    /// external unfolding/reachability tool.
    pub fn to_automata_network(&self, network: &BooleanNetwork) -> String {
        let mut result = String::new();
        for var in &self.variables {
            let name = network.get_variable_name(*var);
            result.push_str(&format!("\"{}\" [0, 1]\n", name));
        }
        for transition in &self.transitions {
            let name = network.get_variable_name(transition.variable);
            let (from, to) = if transition.value { (0, 1) } else { (1, 0) };
            let conditions = transition
                .conditions
                .iter()
                .map(|(var, value)| {
                    format!(
                        "\"{}\"={}",
                        network.get_variable_name(*var),
                        i32::from(*value)
                    )
                })
                .collect::<Vec<_>>();
            if conditions.is_empty() {
                result.push_str(&format!("\"{}\" {} -> {}\n", name, from, to));
            } else {
                result.push_str(&format!(
                    "\"{}\" {} -> {} when {}\n",
                    name,
                    from,
                    to,
                    conditions.join(" and ")
                ));
            }
        }
        result
    }
}

/// Compute a DNF representation of the given `Bdd` as a list of partial
/// valuations, using a recursive splitting strategy.
///
/// At every step the function splits on the support variable minimizing the
/// size of the two restricted BDDs. This is often considerably smaller than
/// the raw clause sequence of the BDD, though still not the optimal DNF.
pub fn optimized_dnf(bdd: &Bdd) -> Vec<BddPartialValuation> {
    let mut results = Vec::new();
    dnf_recursive(bdd, &mut BddPartialValuation::empty(), &mut results);
    results
}

fn dnf_recursive(bdd: &Bdd, path: &mut BddPartialValuation, results: &mut Vec<BddPartialValuation>) {
    if bdd.is_false() {
        return;
    }
    if bdd.is_true() {
        results.push(path.clone());
        return;
    }

    let mut support = bdd.support_set().into_iter().collect::<Vec<_>>();
    support.sort();

    let mut best_var = support[0];
    let mut best_size = usize::MAX;
    for var in support {
        let t = bdd.var_restrict(var, true);
        let f = bdd.var_restrict(var, false);
        let size = t.size() + f.size();
        if size < best_size {
            best_size = size;
            best_var = var;
        }
    }

    path[best_var] = Some(true);
    dnf_recursive(&bdd.var_restrict(best_var, true), path, results);

    path[best_var] = Some(false);
    dnf_recursive(&bdd.var_restrict(best_var, false), path, results);

    path[best_var] = None;
}

#[cfg(test)]
mod tests {
    use crate::petri_net::{optimized_dnf, PetriNet};
    use crate::symbolic::SymbolicAsyncGraph;
    use crate::{BooleanNetwork, ExtendedBoolean, Space};

    fn example_network() -> BooleanNetwork {
        BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, a
            b, a & c
            c, !a | b
        ",
        )
        .unwrap()
    }

    #[test]
    fn implicant_encoding() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);

        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();

        assert_eq!(3, net.variables().len());
        // `a` is a source, so no transition may change it.
        assert_eq!(vec![a], net.source_variables());
        assert!(net.transitions().iter().all(|t| t.variable != a));

        // `b` goes up only when `a & c` holds.
        let b_up: Vec<_> = net
            .transitions()
            .iter()
            .filter(|t| t.variable == b && t.value)
            .collect();
        assert_eq!(1, b_up.len());
        assert_eq!(2, b_up[0].conditions.len());

        // Every reachable transition guard references only encoded variables.
        for t in net.transitions() {
            for (var, _) in &t.conditions {
                assert!(net.variables().contains(var));
                assert_ne!(*var, t.variable);
            }
        }
    }

    #[test]
    fn restriction() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);

        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();

        let mut space = Space::new(&bn);
        space[a] = ExtendedBoolean::Zero;
        let restricted = net.restrict(&space);

        assert_eq!(2, restricted.variables().len());
        // With a=0, `b` can never go up.
        assert!(!restricted
            .transitions()
            .iter()
            .any(|t| t.variable == b && t.value));
        // And `c` goes up unconditionally.
        let c = bn.as_graph().find_variable("c").unwrap();
        assert!(restricted
            .transitions()
            .iter()
            .any(|t| t.variable == c && t.value && t.conditions.is_empty()));

        // The structural restriction agrees with re-encoding the sub-space.
        let direct = PetriNet::for_space(&stg, &space);
        assert_eq!(restricted.variables(), direct.variables());
        for t in direct.transitions() {
            assert!(restricted.transitions().contains(t));
        }
    }

    #[test]
    fn retained_set_reduction() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);
        let c = bn.as_graph().find_variable("c").unwrap();

        let reduced = net.reduce_to_retained_set(&[(c, true)]);
        assert!(!reduced.transitions().iter().any(|t| t.variable == c && !t.value));
        assert!(reduced.transitions().iter().any(|t| t.variable == c && t.value));
    }

    #[test]
    fn dnf_covers_function() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let b = bn.as_graph().find_variable("b").unwrap();
        let fn_bdd = stg.get_fn_update_bdd(b);
        let ctx = stg.symbolic_context().bdd_variable_set();

        let clauses = optimized_dnf(fn_bdd);
        let rebuilt = clauses
            .iter()
            .fold(ctx.mk_false(), |acc, clause| {
                acc.or(&ctx.mk_conjunctive_clause(clause))
            });
        assert_eq!(*fn_bdd, rebuilt);
    }

    #[test]
    fn automata_network_export() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);
        let an = net.to_automata_network(&bn);
        assert!(an.contains("\"a\" [0, 1]"));
        assert!(an.contains("\"b\" 0 -> 1 when"));
    }
}
