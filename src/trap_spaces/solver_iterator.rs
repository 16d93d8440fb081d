use crate::trap_spaces::{PnSolver, TrapSpaceProblem};
use crate::{AnalysisError, Space, VariableId};
use z3::ast::Bool;
use z3::SatResult;

/// An iterator that walks all satisfying results of the trap-space solver.
///
/// Every reported model is locally optimised first: for [TrapSpaceProblem::Min],
/// the fixings are extended to a maximal conflict-free set (a minimal trap
/// space); for [TrapSpaceProblem::Max], they are reduced to a subset-minimal
/// set (a maximal trap space). A blocking clause then excludes every model that
/// would rediscover the reported space, so the stream is duplicate-free.
///
/// The iterator is finite and non-restartable. A solver timeout terminates the
/// stream with an [AnalysisError::Timeout] item.
pub struct TrapSpaceIterator<'z3> {
    solver: PnSolver<'z3>,
    problem: TrapSpaceProblem,
    finished: bool,
}

impl<'z3> TrapSpaceIterator<'z3> {
    pub(crate) fn new(solver: PnSolver<'z3>, problem: TrapSpaceProblem) -> TrapSpaceIterator<'z3> {
        TrapSpaceIterator {
            solver,
            problem,
            finished: false,
        }
    }

    /// **(internal)** Variables of the net that do not appear in `fixings`.
    fn free_variables(&self, fixings: &[(VariableId, bool)]) -> Vec<VariableId> {
        self.solver
            .as_context()
            .as_net()
            .variables()
            .iter()
            .cloned()
            .filter(|var| !fixings.iter().any(|(fixed, _)| fixed == var))
            .collect()
    }

    /// **(internal)** Extend the given fixings to a maximal set that still
    /// describes a (trap-space) model. The result is a minimal trap space.
    fn descend(
        &self,
        mut fixings: Vec<(VariableId, bool)>,
    ) -> Result<Vec<(VariableId, bool)>, AnalysisError> {
        let context = self.solver.as_context();
        loop {
            let free = self.free_variables(&fixings);
            if free.is_empty() {
                return Ok(fixings);
            }

            self.solver.push();
            for (var, value) in &fixings {
                self.solver.assert(context.fix_literal(*var, *value));
            }
            // At least one currently free variable becomes fixed.
            let extensions: Vec<&Bool<'z3>> = free
                .iter()
                .flat_map(|var| [context.fix_literal(*var, false), context.fix_literal(*var, true)])
                .collect();
            self.solver.assert(&Bool::or(context.as_z3(), &extensions));

            match self.solver.check() {
                SatResult::Sat => {
                    let model = self.solver.get_model().unwrap();
                    fixings = model.get_fixings();
                    self.solver.pop();
                }
                SatResult::Unsat => {
                    self.solver.pop();
                    return Ok(fixings);
                }
                SatResult::Unknown => {
                    self.solver.pop();
                    return Err(AnalysisError::Timeout {
                        op: "trap-space solver (minimisation)".to_string(),
                    });
                }
            }
        }
    }

    /// **(internal)** Reduce the given fixings to a subset-minimal set that still
    /// describes a model of the `Max` constraints. The result is a maximal
    /// trap space.
    fn ascend(
        &self,
        mut fixings: Vec<(VariableId, bool)>,
    ) -> Result<Vec<(VariableId, bool)>, AnalysisError> {
        let context = self.solver.as_context();
        loop {
            self.solver.push();
            // Fixed variables keep their value or become free...
            for (var, value) in &fixings {
                self.solver
                    .assert(&context.fix_literal(*var, !*value).not());
            }
            // ...free variables stay free...
            for var in self.free_variables(&fixings) {
                self.solver.assert(&context.fix_literal(var, false).not());
                self.solver.assert(&context.fix_literal(var, true).not());
            }
            // ...and at least one fixing is dropped.
            let dropped: Vec<Bool<'z3>> = fixings
                .iter()
                .map(|(var, value)| context.fix_literal(*var, *value).not())
                .collect();
            let dropped_refs: Vec<&Bool<'z3>> = dropped.iter().collect();
            self.solver.assert(&Bool::or(context.as_z3(), &dropped_refs));

            match self.solver.check() {
                SatResult::Sat => {
                    let model = self.solver.get_model().unwrap();
                    fixings = model.get_fixings();
                    self.solver.pop();
                }
                SatResult::Unsat => {
                    self.solver.pop();
                    return Ok(fixings);
                }
                SatResult::Unknown => {
                    self.solver.pop();
                    return Err(AnalysisError::Timeout {
                        op: "trap-space solver (maximisation)".to_string(),
                    });
                }
            }
        }
    }

    /// **(internal)** Permanently exclude the reported space from the stream.
    fn block(&self, fixings: &[(VariableId, bool)]) {
        let context = self.solver.as_context();
        let mut clause = Vec::new();
        match self.problem {
            TrapSpaceProblem::Fix => {
                // Exclude exactly this model.
                for (var, value) in fixings {
                    clause.push(context.fix_literal(*var, !*value).clone());
                }
            }
            TrapSpaceProblem::Min => {
                // Exclude every super-space: any later model must carry a fixing
                // that the reported space does not have.
                for (var, value) in fixings {
                    clause.push(context.fix_literal(*var, !*value).clone());
                }
                for var in self.free_variables(fixings) {
                    clause.push(context.fix_literal(var, false).clone());
                    clause.push(context.fix_literal(var, true).clone());
                }
            }
            TrapSpaceProblem::Max => {
                // Exclude every sub-space: any later model must miss one of the
                // reported fixings.
                for (var, value) in fixings {
                    clause.push(context.fix_literal(*var, *value).not());
                }
            }
        }
        if clause.is_empty() {
            // The reported space has no alternative (e.g. the enclosing space
            // is a fixed point); terminate the stream.
            self.solver
                .assert(&Bool::from_bool(context.as_z3(), false));
            return;
        }
        let clause_refs: Vec<&Bool<'z3>> = clause.iter().collect();
        self.solver
            .assert(&Bool::or(context.as_z3(), &clause_refs));
    }
}

impl<'z3> Iterator for TrapSpaceIterator<'z3> {
    type Item = Result<Space, AnalysisError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.solver.check() {
            SatResult::Unsat => {
                self.finished = true;
                return None;
            }
            SatResult::Unknown => {
                self.finished = true;
                return Some(Err(AnalysisError::Timeout {
                    op: "trap-space solver".to_string(),
                }));
            }
            SatResult::Sat => (),
        }

        let model = self.solver.get_model().unwrap();
        let fixings = model.get_fixings();

        let optimised = match self.problem {
            TrapSpaceProblem::Fix => Ok(fixings),
            TrapSpaceProblem::Min => self.descend(fixings),
            TrapSpaceProblem::Max => self.ascend(fixings),
        };

        let fixings = match optimised {
            Ok(fixings) => fixings,
            Err(error) => {
                self.finished = true;
                return Some(Err(error));
            }
        };

        self.block(&fixings);

        let mut space = self.solver.as_context().within().clone();
        for (var, value) in fixings {
            space[var] = crate::ExtendedBoolean::from(value);
        }
        Some(Ok(space))
    }
}
