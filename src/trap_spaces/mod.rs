//! The trap-space oracle: enumeration of minimal trap spaces, maximal trap
//! spaces and fixed points of a Petri-net-encoded Boolean network.
//!
//! The encoding follows the "siphon" characterisation of trap spaces: a
//! sub-space is a trap space exactly when, for every transition `t: i -> b`
//! whose firing would leave the space (i.e. `i` is fixed to `!b`), at least one
//! read arc of `t` is contradicted by the fixed values. This yields one Horn
//! clause per transition over the literals `fix(i, 0)` / `fix(i, 1)`.
//!
//! The constraints are solved by Z3. Models are streamed using incremental
//! blocking clauses: a model is first *locally optimised* (descended to a
//! minimal trap space, or ascended to a maximal one) through push/pop queries,
//! then reported, and finally excluded together with every space that would
//! re-discover it.

use crate::petri_net::PetriNet;
use crate::{AnalysisError, Space};

/// **(internal)** The Z3 context/solver/model wrappers for the Petri-net encoding.
mod solver_context;
/// **(internal)** The streaming enumeration with local optimisation and blocking.
mod solver_iterator;

pub use solver_context::{PnSolver, PnSolverContext, PnSolverModel};
pub use solver_iterator::TrapSpaceIterator;

/// The problem solved by one oracle query.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrapSpaceProblem {
    /// Enumerate *minimal* trap spaces.
    Min,
    /// Enumerate *maximal* non-trivial trap sub-spaces ("stable motifs").
    Max,
    /// Enumerate fixed points.
    Fix,
}

/// Aggregates the trap-space enumeration queries.
pub struct TrapSpaces {
    _dummy: (),
}

impl TrapSpaces {
    /// Enumerate the trap spaces of `net` (which must already be restricted to
    /// the free variables of `within`), solving the given `problem`.
    ///
    /// The fixings of `within` are merged into every reported space. Spaces that
    /// are a subset of any `avoid` space are excluded. With
    /// `fix_source_variables`, every source variable of the net must be fixed in
    /// the reported spaces (this collapses `k` sources into `2^k` combination
    /// spaces and is the standard mode of succession diagram expansion).
    ///
    /// The result is truncated to `limit` answers and sorted by the canonical
    /// space key, so equally optimal spaces are reported in lexicographic
    /// order of their fixed variables.
    #[allow(clippy::too_many_arguments)]
    pub fn enumerate(
        net: &PetriNet,
        within: &Space,
        problem: TrapSpaceProblem,
        avoid: &[Space],
        fix_source_variables: bool,
        limit: Option<usize>,
        solver_timeout_ms: Option<u64>,
    ) -> Result<Vec<Space>, AnalysisError> {
        let z3_config = z3::Config::new();
        let z3 = z3::Context::new(&z3_config);
        let context = PnSolverContext::new(&z3, net, within);
        let iterator = context.enumerate(problem, avoid, fix_source_variables, solver_timeout_ms);

        let mut results = Vec::new();
        for space in iterator {
            results.push(space?);
            if let Some(limit) = limit {
                if results.len() >= limit {
                    break;
                }
            }
        }
        results.sort_by_key(|space| space.unique_key());
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use crate::petri_net::PetriNet;
    use crate::symbolic::SymbolicAsyncGraph;
    use crate::trap_spaces::{TrapSpaceProblem, TrapSpaces};
    use crate::{BooleanNetwork, ExtendedBoolean, Space};

    fn enumerate_all(
        net: &PetriNet,
        within: &Space,
        problem: TrapSpaceProblem,
    ) -> Vec<Space> {
        TrapSpaces::enumerate(net, within, problem, &[], false, None, None).unwrap()
    }

    #[test]
    fn fixed_points_of_a_toggle() {
        // a and b copy each other: two fixed points, 00 and 11.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a
        ",
        )
        .unwrap();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);

        let fixed = enumerate_all(&net, &Space::new(&bn), TrapSpaceProblem::Fix);
        assert_eq!(2, fixed.len());
        for space in &fixed {
            assert!(space.is_singleton());
            assert!(stg.is_trap_space(space));
        }

        // 00 sorts before 11 thanks to the canonical key.
        let a = bn.as_graph().find_variable("a").unwrap();
        assert_eq!(ExtendedBoolean::Zero, fixed[0][a]);
        assert_eq!(ExtendedBoolean::One, fixed[1][a]);
    }

    #[test]
    fn minimal_and_maximal_trap_spaces() {
        // A classic two-motif example: a has a positive self-regulation
        // through b, and c oscillates below it.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a
            c, !c | a
        ",
        )
        .unwrap();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);
        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();
        let c = bn.as_graph().find_variable("c").unwrap();

        let minimal = enumerate_all(&net, &Space::new(&bn), TrapSpaceProblem::Min);
        // Minimal traps: a=0,b=0 (c oscillates) and a=1,b=1,c=1.
        assert_eq!(2, minimal.len());
        for space in &minimal {
            assert!(stg.is_trap_space(space));
            assert_eq!(*space, stg.percolate_space(space));
        }
        assert_eq!(ExtendedBoolean::Zero, minimal[0][a]);
        assert_eq!(ExtendedBoolean::Any, minimal[0][c]);
        assert_eq!(ExtendedBoolean::One, minimal[1][c]);

        let maximal = enumerate_all(&net, &Space::new(&bn), TrapSpaceProblem::Max);
        // Maximal motifs: {a=0, b=0} and {a=1, b=1} (c=1 alone is not a trap).
        assert_eq!(2, maximal.len());
        for space in &maximal {
            assert!(stg.is_trap_space(space));
            assert_eq!(2, space.count_fixed());
            assert!(space[c].is_any());
        }

        // Enumeration within the a=1, b=1 motif: single minimal trap c=1.
        let mut motif = Space::new(&bn);
        motif[a] = ExtendedBoolean::One;
        motif[b] = ExtendedBoolean::One;
        let restricted = net.restrict(&motif);
        let inner = enumerate_all(&restricted, &motif, TrapSpaceProblem::Min);
        assert_eq!(1, inner.len());
        assert!(inner[0].is_singleton());
        assert_eq!(ExtendedBoolean::One, inner[0][c]);
    }

    #[test]
    fn avoided_spaces_and_limits() {
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            a, b
            b, a
        ",
        )
        .unwrap();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);
        let a = bn.as_graph().find_variable("a").unwrap();
        let b = bn.as_graph().find_variable("b").unwrap();

        let mut zero = Space::new(&bn);
        zero[a] = ExtendedBoolean::Zero;
        zero[b] = ExtendedBoolean::Zero;

        let avoided = TrapSpaces::enumerate(
            &net,
            &Space::new(&bn),
            TrapSpaceProblem::Fix,
            &[zero.clone()],
            false,
            None,
            None,
        )
        .unwrap();
        assert_eq!(1, avoided.len());
        assert_eq!(ExtendedBoolean::One, avoided[0][a]);

        let limited = TrapSpaces::enumerate(
            &net,
            &Space::new(&bn),
            TrapSpaceProblem::Fix,
            &[],
            false,
            Some(1),
            None,
        )
        .unwrap();
        assert_eq!(1, limited.len());
    }

    #[test]
    fn source_variables_must_be_fixed_in_max_mode() {
        // One source variable and one dependent variable.
        let bn = BooleanNetwork::try_from_bnet(
            r"
            targets, factors
            s, s
            x, s & x
        ",
        )
        .unwrap();
        let stg = SymbolicAsyncGraph::new(&bn);
        let net = PetriNet::new(&stg);
        let s = bn.as_graph().find_variable("s").unwrap();

        let motifs = TrapSpaces::enumerate(
            &net,
            &Space::new(&bn),
            TrapSpaceProblem::Max,
            &[],
            true,
            None,
            None,
        )
        .unwrap();
        for motif in &motifs {
            assert!(motif[s].is_fixed());
        }
        // s=0 percolates further, but as a *maximal* motif we see both source
        // choices and the independent x=0 cannot appear without s fixed.
        assert_eq!(2, motifs.len());
    }
}
