use crate::symbolic::{SymbolicContext, VertexSet};
use biodivine_lib_bdd::{Bdd, BddValuation, BddVariable};
use num_bigint::BigInt;

impl VertexSet {
    /// Wrap a raw `Bdd` into a vertex set. The `Bdd` must belong to a context
    /// where every BDD variable is a state variable.
    pub fn new(bdd: Bdd) -> VertexSet {
        VertexSet { bdd }
    }

    /// An empty vertex set within the given context.
    pub fn empty(context: &SymbolicContext) -> VertexSet {
        VertexSet::new(context.bdd_variable_set().mk_false())
    }

    /// Convert this set to a raw `Bdd`.
    pub fn into_bdd(self) -> Bdd {
        self.bdd
    }

    /// A reference to the underlying `Bdd`.
    pub fn as_bdd(&self) -> &Bdd {
        &self.bdd
    }

    pub fn union(&self, other: &VertexSet) -> VertexSet {
        VertexSet::new(self.bdd.or(&other.bdd))
    }

    pub fn intersect(&self, other: &VertexSet) -> VertexSet {
        VertexSet::new(self.bdd.and(&other.bdd))
    }

    pub fn minus(&self, other: &VertexSet) -> VertexSet {
        VertexSet::new(self.bdd.and_not(&other.bdd))
    }

    /// The complement of this set with respect to the whole state space.
    pub fn complement(&self) -> VertexSet {
        VertexSet::new(self.bdd.not())
    }

    pub fn is_empty(&self) -> bool {
        self.bdd.is_false()
    }

    /// Subset test that avoids materializing the combined BDD: the operation
    /// can only produce a `false` BDD within the node limit, anything else
    /// terminates early.
    pub fn is_subset(&self, other: &VertexSet) -> bool {
        Bdd::binary_op_with_limit(
            1,
            &self.bdd,
            &other.bdd,
            biodivine_lib_bdd::op_function::and_not,
        )
        .is_some()
    }

    /// Approximate number of states in this set (subject to `f64` precision).
    pub fn approx_cardinality(&self) -> f64 {
        self.bdd.cardinality()
    }

    /// Exact number of states in this set.
    pub fn exact_cardinality(&self) -> BigInt {
        self.bdd.exact_cardinality()
    }

    /// The number of BDD nodes representing this set.
    pub fn symbolic_size(&self) -> usize {
        self.bdd.size()
    }

    /// Existential projection: remove the given variable, keeping states that
    /// appear with *some* value of it.
    pub fn var_exists(&self, variable: BddVariable) -> VertexSet {
        VertexSet::new(self.bdd.var_exists(variable))
    }

    /// Universal projection: remove the given variable, keeping states that
    /// appear with *both* values of it.
    pub fn var_for_all(&self, variable: BddVariable) -> VertexSet {
        VertexSet::new(self.bdd.var_for_all(variable))
    }

    /// Fix the given variable to `value` and remove it from the support
    /// of the set.
    pub fn var_restrict(&self, variable: BddVariable, value: bool) -> VertexSet {
        VertexSet::new(self.bdd.var_restrict(variable, value))
    }

    /// Pick a single state from this set, or `None` when the set is empty.
    pub fn witness(&self) -> Option<BddValuation> {
        self.bdd.sat_witness()
    }

    /// Deterministically reduce this set to a subset containing exactly one
    /// state (empty sets are preserved).
    pub fn pick_singleton(&self) -> VertexSet {
        if let Some(valuation) = self.witness() {
            VertexSet::new(Bdd::from(valuation))
        } else {
            self.clone()
        }
    }

    /// Iterate up to `limit` states of this set.
    ///
    /// The iteration is finite and non-restartable. The explicit `limit` bounds
    /// the work performed even for astronomically large sets.
    pub fn iter_states(&self, limit: usize) -> impl Iterator<Item = BddValuation> + '_ {
        self.bdd.sat_valuations().take(limit)
    }
}

#[cfg(test)]
mod tests {
    use crate::symbolic::{SymbolicContext, VertexSet};
    use crate::BooleanNetwork;

    #[test]
    fn vertex_set_operations() {
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a
            c, a & b
        ",
        )
        .unwrap();
        let ctx = SymbolicContext::new(&bn);
        let a = bn.as_graph().find_variable("a").unwrap();

        let unit = VertexSet::new(ctx.mk_constant(true));
        let a_true = VertexSet::new(ctx.mk_state_variable_is_true(a));

        assert_eq!(8.0, unit.approx_cardinality());
        assert_eq!(4.0, a_true.approx_cardinality());
        assert!(a_true.is_subset(&unit));
        assert!(!unit.is_subset(&a_true));
        assert_eq!(4.0, unit.minus(&a_true).approx_cardinality());
        assert_eq!(unit.minus(&a_true), a_true.complement());
        assert!(a_true.intersect(&a_true.minus(&unit)).is_empty());

        let singleton = a_true.pick_singleton();
        assert_eq!(1.0, singleton.approx_cardinality());
        assert!(singleton.is_subset(&a_true));

        assert_eq!(3, a_true.iter_states(3).count());
        assert_eq!(4, a_true.iter_states(1000).count());

        let a_var = ctx.get_state_variable(a);
        assert_eq!(unit, a_true.var_exists(a_var));
        assert!(a_true.var_for_all(a_var).is_empty());
        assert_eq!(unit, a_true.var_restrict(a_var, true));
    }
}
