use crate::petri_net::PetriNet;
use crate::trap_spaces::solver_iterator::TrapSpaceIterator;
use crate::trap_spaces::TrapSpaceProblem;
use crate::{Space, VariableId};
use std::collections::HashMap;
use z3::ast::Bool;
use z3::{Params, SatResult, Solver};

/// A helper object that tracks the mapping between the places of a Petri-net
/// encoded Boolean network and the `fix(v, 0)` / `fix(v, 1)` literals of the
/// trap-space logic program in Z3.
pub struct PnSolverContext<'z3> {
    z3: &'z3 z3::Context,
    net: &'z3 PetriNet,
    within: Space,
    fix_zero: HashMap<VariableId, Bool<'z3>>,
    fix_one: HashMap<VariableId, Bool<'z3>>,
}

/// A helper object that encapsulates a Z3 `Solver` with an API that is more
/// friendly when used for trap-space enumeration.
pub struct PnSolver<'z3> {
    context: &'z3 PnSolverContext<'z3>,
    solver: Solver<'z3>,
}

/// A helper object that encapsulates a Z3 `Model` of the trap-space constraints.
pub struct PnSolverModel<'z3> {
    context: &'z3 PnSolverContext<'z3>,
    model: z3::Model<'z3>,
}

impl<'z3> PnSolverContext<'z3> {
    /// Create a new solver context for the given net. The `within` space carries
    /// the fixed variables that the net was restricted to; its fixings are merged
    /// into every enumerated space.
    pub fn new(z3: &'z3 z3::Context, net: &'z3 PetriNet, within: &Space) -> PnSolverContext<'z3> {
        let mut fix_zero = HashMap::new();
        let mut fix_one = HashMap::new();
        for var in net.variables() {
            let zero = Bool::new_const(z3, format!("f0_{}", var.to_index()));
            let one = Bool::new_const(z3, format!("f1_{}", var.to_index()));
            fix_zero.insert(*var, zero);
            fix_one.insert(*var, one);
        }
        PnSolverContext {
            z3,
            net,
            within: within.clone(),
            fix_zero,
            fix_one,
        }
    }

    /// Get a reference to the underlying Z3 context.
    pub fn as_z3(&self) -> &'z3 z3::Context {
        self.z3
    }

    /// Get a reference to the encoded Petri net.
    pub fn as_net(&self) -> &PetriNet {
        self.net
    }

    /// The space the net was restricted to.
    pub fn within(&self) -> &Space {
        &self.within
    }

    /// The literal stating that `variable` is fixed to `value`.
    pub fn fix_literal(&self, variable: VariableId, value: bool) -> &Bool<'z3> {
        if value {
            &self.fix_one[&variable]
        } else {
            &self.fix_zero[&variable]
        }
    }

    /// Create a new solver with the base trap-space constraints asserted:
    /// conflict-freeness of the literals plus one escape clause per transition.
    pub fn mk_trap_space_solver(&'z3 self, timeout_ms: Option<u64>) -> PnSolver<'z3> {
        let solver = Solver::new(self.z3);
        if let Some(timeout) = timeout_ms {
            let mut params = Params::new(self.z3);
            params.set_u32("timeout", u32::try_from(timeout).unwrap_or(u32::MAX));
            solver.set_params(&params);
        }

        for var in self.net.variables() {
            let zero = self.fix_literal(*var, false);
            let one = self.fix_literal(*var, true);
            // A variable cannot be fixed to both values at once.
            solver.assert(&Bool::and(self.z3, &[zero, one]).not());
        }

        for transition in self.net.transitions() {
            // If the changed variable is fixed against the transition's target
            // value, some read arc must be contradicted by the fixed values
            // (otherwise the transition could fire inside the space and escape).
            let escapes = self.fix_literal(transition.variable, !transition.value);
            if transition.conditions.is_empty() {
                solver.assert(&escapes.not());
                continue;
            }
            let contradicted: Vec<&Bool<'z3>> = transition
                .conditions
                .iter()
                .map(|(var, value)| self.fix_literal(*var, !*value))
                .collect();
            let some_contradicted = Bool::or(self.z3, &contradicted);
            solver.assert(&escapes.implies(&some_contradicted));
        }

        PnSolver {
            context: self,
            solver,
        }
    }

    /// Start the streaming enumeration of trap spaces for the given `problem`.
    ///
    /// See [crate::trap_spaces::TrapSpaces::enumerate] for the meaning of the
    /// remaining arguments.
    pub fn enumerate(
        &'z3 self,
        problem: TrapSpaceProblem,
        avoid: &[Space],
        fix_source_variables: bool,
        timeout_ms: Option<u64>,
    ) -> TrapSpaceIterator<'z3> {
        let solver = self.mk_trap_space_solver(timeout_ms);

        match problem {
            TrapSpaceProblem::Fix => {
                // Fixed points must fix every variable.
                for var in self.net.variables() {
                    solver.assert_fixed(*var);
                }
            }
            TrapSpaceProblem::Max => {
                // Maximal trap spaces must fix at least one variable.
                let fixed: Vec<&Bool<'z3>> = self
                    .net
                    .variables()
                    .iter()
                    .flat_map(|var| [self.fix_literal(*var, false), self.fix_literal(*var, true)])
                    .collect();
                if fixed.is_empty() {
                    solver.assert(&Bool::from_bool(self.z3, false));
                } else {
                    solver.assert(&Bool::or(self.z3, &fixed));
                }
                if fix_source_variables {
                    // A maximal space with a free source variable is never useful:
                    // require all source variables to be fixed, which reports the
                    // source combinations instead of their factorial interleavings.
                    for var in self.net.source_variables() {
                        solver.assert_fixed(var);
                    }
                }
            }
            TrapSpaceProblem::Min => (),
        }

        for avoided in avoid {
            self.assert_avoid(&solver, avoided);
        }

        TrapSpaceIterator::new(solver, problem)
    }

    /// **(internal)** Exclude all models that describe a sub-space of `avoided`.
    fn assert_avoid(&self, solver: &PnSolver<'z3>, avoided: &Space) {
        let mut required = Vec::new();
        for (var, value) in avoided.to_values() {
            match self.within[var].try_as_bool() {
                Some(fixed) if fixed == value => {
                    // Implied by the enclosing space; nothing to check.
                }
                Some(_) => {
                    // The avoided space does not intersect the enclosing space,
                    // hence no model needs to be excluded.
                    return;
                }
                None => required.push(self.fix_literal(var, value)),
            }
        }
        if required.is_empty() {
            // Every model is a sub-space of `avoided`: the query has no answers.
            solver.assert(&Bool::from_bool(self.z3, false));
            return;
        }
        let all_required = Bool::and(self.z3, &required);
        solver.assert(&all_required.not());
    }
}

impl<'z3> PnSolver<'z3> {
    /// Get a reference to the underlying solver context.
    pub fn as_context(&self) -> &'z3 PnSolverContext<'z3> {
        self.context
    }

    pub fn assert(&self, assertion: &Bool<'z3>) {
        self.solver.assert(assertion);
    }

    /// Require that the given variable is fixed (to either value).
    pub fn assert_fixed(&self, variable: VariableId) {
        let zero = self.context.fix_literal(variable, false);
        let one = self.context.fix_literal(variable, true);
        self.solver.assert(&Bool::or(self.context.z3, &[zero, one]));
    }

    pub fn check(&self) -> SatResult {
        self.solver.check()
    }

    pub fn push(&self) {
        self.solver.push();
    }

    pub fn pop(&self) {
        self.solver.pop(1);
    }

    /// Read the current model, or `None` when the last `check` was not `Sat`.
    pub fn get_model(&self) -> Option<PnSolverModel<'z3>> {
        self.solver.get_model().map(|model| PnSolverModel {
            context: self.context,
            model,
        })
    }
}

impl<'z3> PnSolverModel<'z3> {
    /// Read the fixings of the encoded variables from this model.
    pub fn get_fixings(&self) -> Vec<(VariableId, bool)> {
        let mut fixings = Vec::new();
        for var in self.context.net.variables() {
            for value in [false, true] {
                let literal = self.context.fix_literal(*var, value);
                let is_fixed = self
                    .model
                    .eval(literal, true)
                    .and_then(|it| it.as_bool())
                    .unwrap_or(false);
                if is_fixed {
                    fixings.push((*var, value));
                }
            }
        }
        fixings
    }

    /// Convert this model into a [Space], merging in the fixings of the
    /// enclosing space.
    pub fn get_space(&self) -> Space {
        let mut space = self.context.within.clone();
        for (var, value) in self.get_fixings() {
            space[var] = crate::ExtendedBoolean::from(value);
        }
        space
    }
}
