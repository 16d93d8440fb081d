use crate::symbolic::SymbolicContext;
use crate::{BinaryOp, BooleanNetwork, ExtendedBoolean, FnUpdate, Space, VariableId};
use biodivine_lib_bdd::{
    Bdd, BddPartialValuation, BddValuation, BddVariable, BddVariableSet,
};

impl SymbolicContext {
    /// Create a new `SymbolicContext` with one BDD variable per network variable,
    /// ordered the same way as the network variables.
    pub fn new(network: &BooleanNetwork) -> SymbolicContext {
        let names: Vec<String> = network
            .variables()
            .map(|it| network.get_variable_name(it).clone())
            .collect();
        let name_refs: Vec<&str> = names.iter().map(|it| it.as_str()).collect();
        let bdd = BddVariableSet::new(&name_refs);
        let state_variables = bdd.variables();
        SymbolicContext {
            bdd,
            state_variables,
        }
    }

    /// A reference to the underlying [BddVariableSet].
    pub fn bdd_variable_set(&self) -> &BddVariableSet {
        &self.bdd
    }

    /// The symbolic variables encoding the network state.
    pub fn state_variables(&self) -> &Vec<BddVariable> {
        &self.state_variables
    }

    /// The number of network variables tracked by this context.
    pub fn num_state_variables(&self) -> usize {
        self.state_variables.len()
    }

    /// Get the BDD variable representing the given network variable.
    pub fn get_state_variable(&self, variable: VariableId) -> BddVariable {
        self.state_variables[variable.to_index()]
    }

    /// Find the network variable represented by the given BDD variable.
    pub fn find_state_variable(&self, symbolic_variable: BddVariable) -> Option<VariableId> {
        self.state_variables
            .iter()
            .position(|it| *it == symbolic_variable)
            .map(VariableId::from_index)
    }

    /// Create a constant `true`/`false` BDD.
    pub fn mk_constant(&self, value: bool) -> Bdd {
        if value {
            self.bdd.mk_true()
        } else {
            self.bdd.mk_false()
        }
    }

    /// Create a BDD that is true when the given network variable is true.
    pub fn mk_state_variable_is_true(&self, variable: VariableId) -> Bdd {
        self.bdd.mk_var(self.get_state_variable(variable))
    }

    /// Create a BDD that is true exactly when the given `FnUpdate` evaluates
    /// to `true`.
    pub fn mk_fn_update_true(&self, function: &FnUpdate) -> Bdd {
        match function {
            FnUpdate::Const(value) => self.mk_constant(*value),
            FnUpdate::Var(id) => self.mk_state_variable_is_true(*id),
            FnUpdate::Not(inner) => self.mk_fn_update_true(inner).not(),
            FnUpdate::Binary(op, left, right) => {
                let left = self.mk_fn_update_true(left);
                let right = self.mk_fn_update_true(right);
                match op {
                    BinaryOp::And => left.and(&right),
                    BinaryOp::Or => left.or(&right),
                    BinaryOp::Xor => left.xor(&right),
                    BinaryOp::Iff => left.iff(&right),
                    BinaryOp::Imp => left.imp(&right),
                }
            }
        }
    }

    /// Create a BDD representing the states of the given [Space].
    pub fn mk_space(&self, space: &Space) -> Bdd {
        let mut valuation = BddPartialValuation::empty();
        for (var, value) in space.to_values() {
            valuation.set_value(self.get_state_variable(var), value);
        }
        self.bdd.mk_conjunctive_clause(&valuation)
    }

    /// Create a BDD representing a single network state.
    pub fn mk_state(&self, state: &[bool]) -> Bdd {
        let mut valuation = BddPartialValuation::empty();
        for (index, value) in state.iter().enumerate() {
            valuation.set_value(self.state_variables[index], *value);
        }
        self.bdd.mk_conjunctive_clause(&valuation)
    }

    /// Convert the fixings of a [Space] to a list of `(BddVariable, bool)` pairs
    /// accepted by [Bdd::restrict] and [Bdd::select].
    pub fn space_fixings(&self, space: &Space) -> Vec<(BddVariable, bool)> {
        space
            .to_values()
            .into_iter()
            .map(|(var, value)| (self.get_state_variable(var), value))
            .collect()
    }

    /// Convert a satisfying BDD valuation into a network state.
    pub fn valuation_to_state(&self, valuation: &BddValuation) -> Vec<bool> {
        self.state_variables
            .iter()
            .map(|var| valuation[*var])
            .collect()
    }

    /// Convert a network state into a fully-fixed [Space] (a singleton).
    pub fn state_to_space(&self, state: &[bool]) -> Space {
        let mut space = Space::new_raw(self.num_state_variables());
        for (index, value) in state.iter().enumerate() {
            space[VariableId::from_index(index)] = ExtendedBoolean::from(*value);
        }
        space
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::SymbolicContext;
    use crate::{BooleanNetwork, ExtendedBoolean, Space};

    #[test]
    fn context_basics() {
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a & b
        ",
        )
        .unwrap();
        let ctx = SymbolicContext::new(&bn);
        assert_eq!(2, ctx.num_state_variables());

        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();

        let fn_a = ctx.mk_fn_update_true(bn.get_update_function(a).as_ref().unwrap());
        assert_eq!(fn_a, ctx.mk_state_variable_is_true(b));

        let mut space = Space::new(&bn);
        space[a] = ExtendedBoolean::One;
        let space_bdd = ctx.mk_space(&space);
        assert_eq!(2.0, space_bdd.cardinality());

        let state = vec![true, false];
        let state_bdd = ctx.mk_state(&state);
        assert_eq!(1.0, state_bdd.cardinality());
        let valuation = state_bdd.sat_witness().unwrap();
        assert_eq!(state, ctx.valuation_to_state(&valuation));
        assert_eq!(state, ctx.state_to_space(&state).to_values().iter().map(|(_, v)| *v).collect::<Vec<_>>());
    }
}
