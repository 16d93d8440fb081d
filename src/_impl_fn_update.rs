use crate::FnUpdate::*;
use crate::{BinaryOp, BooleanNetwork, FnUpdate, VariableId};
use std::collections::HashSet;
use std::fmt::{Display, Error, Formatter};

/// Constructor and destructor utility methods.
impl FnUpdate {
    /// Create a `true` formula.
    pub fn mk_true() -> FnUpdate {
        Const(true)
    }

    /// Create a `false` formula.
    pub fn mk_false() -> FnUpdate {
        Const(false)
    }

    /// Create an `x` formula where `x` is a network variable.
    pub fn mk_var(id: VariableId) -> FnUpdate {
        Var(id)
    }

    /// Create a `!phi` formula, where `phi` is an inner `FnUpdate`.
    pub fn mk_not(inner: FnUpdate) -> FnUpdate {
        Not(Box::new(inner))
    }

    /// Create a `phi 'op' psi` formula, where `phi` and `psi` are inner `FnUpdate`s.
    pub fn mk_binary(op: BinaryOp, left: FnUpdate, right: FnUpdate) -> FnUpdate {
        Binary(op, Box::new(left), Box::new(right))
    }

    /// Negate this function.
    pub fn negation(self) -> FnUpdate {
        FnUpdate::mk_not(self)
    }

    /// Create a conjunction.
    pub fn and(self, other: FnUpdate) -> FnUpdate {
        FnUpdate::mk_binary(BinaryOp::And, self, other)
    }

    /// Create a disjunction.
    pub fn or(self, other: FnUpdate) -> FnUpdate {
        FnUpdate::mk_binary(BinaryOp::Or, self, other)
    }

    /// If `Const`, return the value, otherwise return `None`.
    pub fn as_const(&self) -> Option<bool> {
        match self {
            Const(value) => Some(*value),
            _ => None,
        }
    }

    /// If `Var`, return the id, otherwise return `None`.
    pub fn as_var(&self) -> Option<VariableId> {
        match self {
            Var(value) => Some(*value),
            _ => None,
        }
    }
}

/// Other utility methods.
impl FnUpdate {
    /// Return a sorted vector of all variables that are actually used as inputs
    /// in this function.
    pub fn collect_arguments(&self) -> Vec<VariableId> {
        fn r_arguments(function: &FnUpdate, args: &mut HashSet<VariableId>) {
            match function {
                Const(_) => (),
                Var(id) => {
                    args.insert(*id);
                }
                Not(inner) => r_arguments(inner, args),
                Binary(_, l, r) => {
                    r_arguments(l, args);
                    r_arguments(r, args);
                }
            };
        }
        let mut args = HashSet::new();
        r_arguments(self, &mut args);
        let mut result: Vec<VariableId> = args.into_iter().collect();
        result.sort();
        result
    }

    /// Test whether the given variable appears in this update function.
    pub fn contains_variable(&self, variable: VariableId) -> bool {
        match self {
            Const(_) => false,
            Var(id) => *id == variable,
            Not(inner) => inner.contains_variable(variable),
            Binary(_, l, r) => l.contains_variable(variable) || r.contains_variable(variable),
        }
    }

    /// Evaluate this function in the given state, reading variable values
    /// through the provided closure.
    pub fn evaluate<F: Fn(VariableId) -> bool>(&self, state: &F) -> bool {
        match self {
            Const(value) => *value,
            Var(id) => state(*id),
            Not(inner) => !inner.evaluate(state),
            Binary(op, left, right) => {
                let left = left.evaluate(state);
                let right = right.evaluate(state);
                match op {
                    BinaryOp::And => left && right,
                    BinaryOp::Or => left || right,
                    BinaryOp::Xor => left != right,
                    BinaryOp::Iff => left == right,
                    BinaryOp::Imp => !left || right,
                }
            }
        }
    }

    /// Convert this update function to a string, taking names from the provided
    /// `BooleanNetwork`.
    pub fn to_string(&self, context: &BooleanNetwork) -> String {
        match self {
            Const(value) => value.to_string(),
            Var(id) => context.get_variable_name(*id).to_string(),
            Not(inner) => format!("!{}", inner.to_string(context)),
            Binary(op, l, r) => {
                format!("({} {} {})", l.to_string(context), op, r.to_string(context))
            }
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match self {
            BinaryOp::And => write!(f, "&"),
            BinaryOp::Or => write!(f, "|"),
            BinaryOp::Xor => write!(f, "^"),
            BinaryOp::Imp => write!(f, "=>"),
            BinaryOp::Iff => write!(f, "<=>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{BinaryOp, FnUpdate, VariableId};

    #[test]
    fn basic_fn_update_properties() {
        let a = VariableId::from_index(0);
        let b = VariableId::from_index(1);
        let fun = FnUpdate::mk_var(a).and(FnUpdate::mk_not(FnUpdate::mk_var(b)));
        assert_eq!(vec![a, b], fun.collect_arguments());
        assert!(fun.contains_variable(a));
        assert!(!fun.contains_variable(VariableId::from_index(2)));
        assert!(fun.evaluate(&|var| var == a));
        assert!(!fun.evaluate(&|_| true));

        let iff = FnUpdate::mk_binary(BinaryOp::Iff, FnUpdate::mk_var(a), FnUpdate::mk_var(b));
        assert!(iff.evaluate(&|_| false));
        assert!(iff.evaluate(&|_| true));
        assert!(!iff.evaluate(&|var| var == b));
    }
}
