use crate::petri_net::optimized_dnf;
use crate::signed_graph::Sign;
use crate::symbolic::SymbolicContext;
use crate::{BooleanNetwork, FnUpdate, RegulatoryGraph, Space, Variable, VariableId, VariableIdIterator};
use biodivine_lib_bdd::Bdd;

/// Basic methods for safely building `BooleanNetwork`s.
impl BooleanNetwork {
    /// Construct a new `BooleanNetwork` with the given variable names and no
    /// update functions (i.e. every variable is initially a free input).
    pub fn new(variables: Vec<String>) -> Result<BooleanNetwork, String> {
        let graph = RegulatoryGraph::new(variables)?;
        let update_functions = vec![None; graph.num_vars()];
        Ok(BooleanNetwork {
            graph,
            update_functions,
        })
    }

    /// Add an update function to the network. Fails when the variable already
    /// has a function.
    pub fn add_update_function(
        &mut self,
        variable: VariableId,
        function: FnUpdate,
    ) -> Result<(), String> {
        if self.update_functions[variable.to_index()].is_some() {
            return Err(format!(
                "Variable `{}` already has an update function.",
                self.get_variable_name(variable)
            ));
        }
        self.update_functions[variable.to_index()] = Some(function);
        Ok(())
    }

    /// Replace the update function of a variable (`None` turns the variable
    /// into a free input).
    pub fn set_update_function(&mut self, variable: VariableId, function: Option<FnUpdate>) {
        self.update_functions[variable.to_index()] = function;
    }

    /// Recompute the regulations of the underlying [RegulatoryGraph] by
    /// monotonicity analysis of the update functions.
    ///
    /// For every function input (in the semantic sense, checked through BDDs),
    /// the regulation is positive when `f|_{x=0} => f|_{x=1}` is a tautology,
    /// negative in the dual case, and unsigned when neither holds. Inputs with
    /// no semantic influence produce no regulation. Free inputs regulate
    /// themselves positively (their implicit function is the identity).
    pub fn infer_regulatory_graph(&mut self) {
        let context = SymbolicContext::new(self);
        let mut regulations = Vec::new();
        for target in self.variables() {
            let Some(function) = self.get_update_function(target) else {
                regulations.push((target, target, Some(Sign::Positive)));
                continue;
            };
            let fn_bdd = context.mk_fn_update_true(function);
            for regulator in function.collect_arguments() {
                let bdd_var = context.get_state_variable(regulator);
                let fn_zero = fn_bdd.var_restrict(bdd_var, false);
                let fn_one = fn_bdd.var_restrict(bdd_var, true);
                if fn_zero == fn_one {
                    // The input is only syntactic, it has no semantic influence.
                    continue;
                }
                let activation = fn_zero.imp(&fn_one).is_true();
                let inhibition = fn_one.imp(&fn_zero).is_true();
                let sign = match (activation, inhibition) {
                    (true, false) => Some(Sign::Positive),
                    (false, true) => Some(Sign::Negative),
                    _ => None,
                };
                regulations.push((regulator, target, sign));
            }
        }
        self.graph.regulations.clear();
        for (regulator, target, sign) in regulations {
            self.graph
                .add_regulation(regulator, target, sign)
                .expect("Inferred regulations cannot clash.");
        }
    }
}

/// Utility methods for exploring the network.
impl BooleanNetwork {
    /// Obtain a reference to the underlying `RegulatoryGraph`.
    pub fn as_graph(&self) -> &RegulatoryGraph {
        &self.graph
    }

    /// The number of variables in this network.
    pub fn num_vars(&self) -> usize {
        self.graph.num_vars()
    }

    /// Return an iterator over all variable ids of this network.
    pub fn variables(&self) -> VariableIdIterator {
        self.graph.variables()
    }

    /// Return the variable object corresponding to the given `VariableId`.
    pub fn get_variable(&self, id: VariableId) -> &Variable {
        self.graph.get_variable(id)
    }

    /// Shorthand for `self.as_graph().get_variable_name(id)`.
    pub fn get_variable_name(&self, id: VariableId) -> &String {
        self.graph.get_variable_name(id)
    }

    /// Get the update function of the given variable, or `None` when the
    /// variable is a free input.
    pub fn get_update_function(&self, variable: VariableId) -> &Option<FnUpdate> {
        &self.update_functions[variable.to_index()]
    }

    /// Variables whose value can never change: free inputs and variables whose
    /// update function is semantically the identity.
    ///
    /// Note that this intentionally excludes variables fixed to a constant.
    pub fn source_variables(&self) -> Vec<VariableId> {
        let context = SymbolicContext::new(self);
        self.variables()
            .filter(|var| match self.get_update_function(*var) {
                None => true,
                Some(function) => {
                    let fn_bdd = context.mk_fn_update_true(function);
                    fn_bdd == context.mk_state_variable_is_true(*var)
                }
            })
            .collect()
    }
}

/// Percolation of the network itself.
impl BooleanNetwork {
    /// Produce a copy of this network with the given space substituted into
    /// every update function.
    ///
    /// Fixed variables obtain constant update functions and the functions of the
    /// remaining variables are simplified accordingly (through BDD restriction,
    /// so non-trivial tautologies introduced by the fixings disappear as well).
    /// The dynamics of the result within the space are exactly the original
    /// dynamics restricted to the space, assuming the space is a trap space.
    pub fn percolate(&self, space: &Space) -> BooleanNetwork {
        let context = SymbolicContext::new(self);
        let fixings = context.space_fixings(space);

        let mut result = self.clone();
        for var in self.variables() {
            if let Some(value) = space[var].try_as_bool() {
                result.set_update_function(var, Some(FnUpdate::Const(value)));
                continue;
            }
            if let Some(function) = self.get_update_function(var) {
                let fn_bdd = context.mk_fn_update_true(function).restrict(&fixings);
                let update = fn_update_from_bdd(&context, &fn_bdd);
                result.set_update_function(var, Some(update));
            }
        }
        result.infer_regulatory_graph();
        result
    }
}

/// **(internal)** Convert a function `Bdd` back into a `FnUpdate` syntax tree,
/// written as a disjunction of the BDD's implicants.
fn fn_update_from_bdd(context: &SymbolicContext, bdd: &Bdd) -> FnUpdate {
    if bdd.is_true() {
        return FnUpdate::Const(true);
    }
    if bdd.is_false() {
        return FnUpdate::Const(false);
    }
    let mut clauses = Vec::new();
    for implicant in optimized_dnf(bdd) {
        let clause = implicant
            .to_values()
            .into_iter()
            .map(|(bdd_var, value)| {
                let id = context.find_state_variable(bdd_var).unwrap();
                if value {
                    FnUpdate::mk_var(id)
                } else {
                    FnUpdate::mk_not(FnUpdate::mk_var(id))
                }
            })
            .reduce(FnUpdate::and);
        clauses.push(clause.unwrap_or(FnUpdate::Const(true)));
    }
    clauses
        .into_iter()
        .reduce(FnUpdate::or)
        .unwrap_or(FnUpdate::Const(false))
}

#[cfg(test)]
mod tests {
    use crate::signed_graph::Sign;
    use crate::{BooleanNetwork, ExtendedBoolean, FnUpdate, Space};

    #[test]
    fn inferred_regulations() {
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, a
            b, a & !c
            c, b | (x & !x)
            x, x
        ",
        )
        .unwrap();
        let rg = bn.as_graph();
        let a = rg.find_variable("a").unwrap();
        let b = rg.find_variable("b").unwrap();
        let c = rg.find_variable("c").unwrap();
        let x = rg.find_variable("x").unwrap();

        assert_eq!(Some(Sign::Positive), rg.find_regulation(a, b).unwrap().sign());
        assert_eq!(Some(Sign::Negative), rg.find_regulation(c, b).unwrap().sign());
        assert_eq!(Some(Sign::Positive), rg.find_regulation(b, c).unwrap().sign());
        // `x` appears in the function of `c`, but has no semantic influence.
        assert!(rg.find_regulation(x, c).is_none());

        assert_eq!(vec![a, x], bn.source_variables());
    }

    #[test]
    fn percolated_network() {
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, a
            b, a & c
            c, !a | b
        ",
        )
        .unwrap();
        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();
        let c = bn.as_graph().find_variable("c").unwrap();

        let mut space = Space::new(&bn);
        space[a] = ExtendedBoolean::Zero;
        space[b] = ExtendedBoolean::Zero;
        space[c] = ExtendedBoolean::One;

        let percolated = bn.percolate(&space);
        assert_eq!(3, percolated.num_vars());
        assert_eq!(
            Some(FnUpdate::Const(false)),
            *percolated.get_update_function(a)
        );
        assert_eq!(
            Some(FnUpdate::Const(true)),
            *percolated.get_update_function(c)
        );
        assert!(percolated.as_graph().regulations().next().is_none());
    }
}
