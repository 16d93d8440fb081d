use crate::symbolic::{SymbolicAsyncGraph, SymbolicContext, VertexSet};
use crate::{BooleanNetwork, ExtendedBoolean, Space, VariableId, VariableIdIterator};
use biodivine_lib_bdd::Bdd;

impl SymbolicAsyncGraph {
    /// Create a symbolic transition graph for the given network.
    ///
    /// Free inputs (variables without an update function) are encoded with the
    /// identity function: they enable no transitions, but are not fixed to
    /// a constant either.
    pub fn new(network: &BooleanNetwork) -> SymbolicAsyncGraph {
        let context = SymbolicContext::new(network);

        let fn_update: Vec<Bdd> = network
            .variables()
            .map(|var| {
                if let Some(function) = network.get_update_function(var) {
                    context.mk_fn_update_true(function)
                } else {
                    context.mk_state_variable_is_true(var)
                }
            })
            .collect();

        let fn_transition: Vec<Bdd> = network
            .variables()
            .map(|var| {
                let var_is_true = context.mk_state_variable_is_true(var);
                fn_update[var.to_index()].xor(&var_is_true)
            })
            .collect();

        SymbolicAsyncGraph {
            vertex_space: (
                VertexSet::new(context.mk_constant(false)),
                VertexSet::new(context.mk_constant(true)),
            ),
            network: network.clone(),
            context,
            fn_update,
            fn_transition,
        }
    }

    /// A reference to the underlying network.
    pub fn as_network(&self) -> &BooleanNetwork {
        &self.network
    }

    /// A reference to the underlying symbolic context.
    pub fn symbolic_context(&self) -> &SymbolicContext {
        &self.context
    }

    /// An iterator over the network variables.
    pub fn variables(&self) -> VariableIdIterator {
        self.network.variables()
    }

    /// The number of network variables.
    pub fn num_vars(&self) -> usize {
        self.network.num_vars()
    }

    /// The symbolic update function `f_i(x) = 1` of the given variable.
    pub fn get_fn_update_bdd(&self, variable: VariableId) -> &Bdd {
        &self.fn_update[variable.to_index()]
    }

    /// An empty vertex set.
    pub fn mk_empty_vertices(&self) -> VertexSet {
        self.vertex_space.0.clone()
    }

    /// The set of all network states.
    pub fn mk_unit_vertices(&self) -> VertexSet {
        self.vertex_space.1.clone()
    }

    pub fn empty_vertices(&self) -> &VertexSet {
        &self.vertex_space.0
    }

    pub fn unit_vertices(&self) -> &VertexSet {
        &self.vertex_space.1
    }

    /// The set of states of the given [Space].
    pub fn mk_subspace(&self, space: &Space) -> VertexSet {
        VertexSet::new(self.context.mk_space(space))
    }
}

/// Basic symbolic graph operators.
impl SymbolicAsyncGraph {
    /// Compute the vertex set which is the result of applying the update function
    /// of the given `variable` to the `initial` set.
    pub fn var_post(&self, variable: VariableId, initial: &VertexSet) -> VertexSet {
        // flip(initial & can_apply_function)
        let output = Bdd::fused_binary_flip_op(
            (initial.as_bdd(), None),
            (&self.fn_transition[variable.to_index()], None),
            Some(self.context.get_state_variable(variable)),
            biodivine_lib_bdd::op_function::and,
        );
        VertexSet::new(output)
    }

    /// Compute the subset of `set` that can perform `post` using the given `variable`.
    pub fn var_can_post(&self, variable: VariableId, set: &VertexSet) -> VertexSet {
        VertexSet::new(
            set.as_bdd()
                .and(&self.fn_transition[variable.to_index()]),
        )
    }

    /// Compute the vertex set which can reach some state in `initial` by applying
    /// the update function of the given `variable`.
    pub fn var_pre(&self, variable: VariableId, initial: &VertexSet) -> VertexSet {
        // flip(initial) & can_apply_function
        let output = Bdd::fused_binary_flip_op(
            (
                initial.as_bdd(),
                Some(self.context.get_state_variable(variable)),
            ),
            (&self.fn_transition[variable.to_index()], None),
            None,
            biodivine_lib_bdd::op_function::and,
        );
        VertexSet::new(output)
    }

    /// Successors of `set` under `variable` that are *outside* of `set`.
    pub fn var_post_out(&self, variable: VariableId, set: &VertexSet) -> VertexSet {
        self.var_post(variable, set).minus(set)
    }

    /// Predecessors of `set` under `variable` that are *outside* of `set`.
    pub fn var_pre_out(&self, variable: VariableId, set: &VertexSet) -> VertexSet {
        self.var_pre(variable, set).minus(set)
    }

    /// Compute the result of applying `post` with *all* update functions
    /// to the `initial` set.
    pub fn post(&self, initial: &VertexSet) -> VertexSet {
        self.variables().fold(self.mk_empty_vertices(), |r, v| {
            r.union(&self.var_post(v, initial))
        })
    }

    /// Compute the result of applying `pre` with *all* update functions
    /// to the `initial` set.
    pub fn pre(&self, initial: &VertexSet) -> VertexSet {
        self.variables().fold(self.mk_empty_vertices(), |r, v| {
            r.union(&self.var_pre(v, initial))
        })
    }

    /// Compute the subset of `set` that can perform *some* `post` operation.
    pub fn can_post(&self, set: &VertexSet) -> VertexSet {
        self.variables().fold(self.mk_empty_vertices(), |r, v| {
            r.union(&self.var_can_post(v, set))
        })
    }
}

/// Space-level operations: percolation and trap tests.
impl SymbolicAsyncGraph {
    /// Compute the *percolation* of the given space: iteratively extend the
    /// fixings with variables whose update function is constant on the current
    /// space, until a fixed point is reached.
    ///
    /// If the argument is a trap space, the result is a trap sub-space.
    /// Percolation of a general space can lead "outside" of the original space;
    /// in that case the original fixed value is kept.
    pub fn percolate_space(&self, space: &Space) -> Space {
        let mut result = space.clone();
        let mut candidates: Vec<VariableId> = result.free_variables();
        loop {
            let fixings = self.context.space_fixings(&result);
            let mut changed = false;
            candidates.retain(|var| {
                let restricted = self.fn_update[var.to_index()].restrict(&fixings);
                let value = if restricted.is_true() {
                    ExtendedBoolean::One
                } else if restricted.is_false() {
                    ExtendedBoolean::Zero
                } else {
                    return true;
                };
                result[*var] = value;
                changed = true;
                false
            });
            if !changed {
                return result;
            }
        }
    }

    /// True if no transition leaves the states of the given space.
    ///
    /// A space is a trap space exactly when the update function of every fixed
    /// variable is constantly equal to the fixed value on the whole space.
    pub fn is_trap_space(&self, space: &Space) -> bool {
        let fixings = self.context.space_fixings(space);
        for (var, value) in space.to_values() {
            let restricted = self.fn_update[var.to_index()].restrict(&fixings);
            let stays = if value {
                restricted.is_true()
            } else {
                restricted.is_false()
            };
            if !stays {
                return false;
            }
        }
        true
    }

    /// True if no transition leaves the given vertex set.
    pub fn is_trap_set(&self, set: &VertexSet) -> bool {
        self.variables()
            .all(|var| self.var_post_out(var, set).is_empty())
    }
}

#[cfg(test)]
mod tests {
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
    fn post_and_pre_operators() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let c = bn.as_graph().find_variable("c").unwrap();

        // In state 000, only `c` can step (to 001).
        let state = stg.mk_subspace(&stg.symbolic_context().state_to_space(&[false, false, false]));
        let post = stg.post(&state);
        assert_eq!(1.0, post.approx_cardinality());
        let next = stg.symbolic_context().state_to_space(&[false, false, true]);
        assert_eq!(post, stg.mk_subspace(&next));
        assert_eq!(state, stg.var_pre(c, &post));

        // The network has three fixed points (001, 100, 111); every other
        // state can perform some transition.
        let can_step = stg.can_post(stg.unit_vertices());
        assert_eq!(5.0, can_step.approx_cardinality());
    }

    #[test]
    fn percolation_and_traps() {
        let bn = example_network();
        let stg = SymbolicAsyncGraph::new(&bn);
        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();
        let c = bn.as_graph().find_variable("c").unwrap();

        // Fixing a=0 percolates to b=0, c=1.
        let mut space = Space::new(&bn);
        space[a] = ExtendedBoolean::Zero;
        let percolated = stg.percolate_space(&space);
        assert_eq!(ExtendedBoolean::Zero, percolated[b]);
        assert_eq!(ExtendedBoolean::One, percolated[c]);
        assert!(stg.is_trap_space(&percolated));

        // Percolation is idempotent.
        assert_eq!(percolated, stg.percolate_space(&percolated));

        // The space b=1 alone is not a trap space.
        let mut not_trap = Space::new(&bn);
        not_trap[b] = ExtendedBoolean::One;
        assert!(!stg.is_trap_space(&not_trap));

        // The whole state space is always a trap.
        assert!(stg.is_trap_space(&Space::new(&bn)));
        assert!(stg.is_trap_set(stg.unit_vertices()));

        // a=1, b=1, c=1 is a fixed point.
        let fixed = stg.symbolic_context().state_to_space(&[true, true, true]);
        assert!(stg.is_trap_space(&fixed));
    }
}
