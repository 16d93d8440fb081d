//! A library for analysing the long-term behaviour of *asynchronous Boolean networks*.
//! As of now, the library supports:
//!  - Import of non-parametrised Boolean networks from the `.bnet` format.
//!  - Enumeration of minimal/maximal trap spaces and fixed points through
//!    a Petri-net encoding solved by Z3 (see the [trap_spaces] module).
//!  - Lazy construction of the network's *succession diagram*: the inclusion-ordered
//!    DAG of percolated trap spaces (see [succession_diagram]).
//!  - Attractor detection within succession diagram nodes, combining NFVS-based
//!    candidate generation, randomised simulation, symbolic reachability and
//!    (optionally) an external Petri-net unfolding tool (see [attractors]).
//!  - Enumeration of driver interventions that force the network into a target
//!    trap space (see [control]).
//!
//! The state space is represented symbolically using `biodivine-lib-bdd`, with one
//! BDD variable per network variable in a fixed global ordering.

#[macro_use]
extern crate lazy_static;

use regex::Regex;
use std::collections::HashMap;
use std::iter::Map;
use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Attractor candidate generation and pruning within succession diagram nodes.
pub mod attractors;
/// Target control based on the succession diagram structure.
pub mod control;
/// Translation of Boolean networks into an implicant Petri-net encoding.
pub mod petri_net;
/// Algorithms on the signed influence graph (SCCs, cycles, feedback vertex sets).
pub mod signed_graph;
/// The succession diagram itself, together with its expansion strategies.
pub mod succession_diagram;
/// Symbolic (BDD) representation of the asynchronous state-transition graph.
pub mod symbolic;
/// The solver-backed trap space oracle.
pub mod trap_spaces;

/// **(internal)** Implements the `.bnet` parser for `BooleanNetwork`.
mod _bnet_parser;
/// **(internal)** Utility methods for `BooleanNetwork`.
mod _impl_boolean_network;
/// **(internal)** Utility methods for `ExtendedBoolean`.
mod _impl_extended_boolean;
/// **(internal)** Utility methods for `FnUpdate`.
mod _impl_fn_update;
/// **(internal)** Utility methods for `RegulatoryGraph`.
mod _impl_regulatory_graph;
/// **(internal)** Utility methods for `Space`.
mod _impl_space;
/// **(internal)** Utility methods for `VariableId`.
mod _impl_variable_id;
/// **(internal)** Configuration options recognised by the analysis.
mod config;
/// **(internal)** The error taxonomy shared by all analysis operations.
mod error;

pub use config::{AnalysisConfig, ExpansionStrategy};
pub use error::AnalysisError;

/// **(internal)** A regex string of an identifier which we allow to appear
/// as a variable name.
const ID_REGEX_STR: &str = r"^[a-zA-Z0-9_]+$";

lazy_static! {
    /// A regular expression that matches the identifiers allowed as names of
    /// network variables.
    static ref ID_REGEX: Regex = Regex::new(ID_REGEX_STR).unwrap();
}

/// Log nothing during long-running operations.
pub const LOG_NOTHING: usize = 0;
/// Log only essential progress messages once the problem size is non-trivial.
pub const LOG_ESSENTIAL: usize = 1;
/// Log everything.
pub const LOG_VERBOSE: usize = 2;

static GLOBAL_LOG_LEVEL: AtomicUsize = AtomicUsize::new(LOG_NOTHING);

/// Read the process-wide log level applied by algorithms that do not take
/// an explicit `log_level` argument.
pub fn global_log_level() -> usize {
    GLOBAL_LOG_LEVEL.load(Ordering::SeqCst)
}

/// Update the process-wide log level (see [global_log_level]).
pub fn set_global_log_level(level: usize) {
    GLOBAL_LOG_LEVEL.store(level, Ordering::SeqCst);
}

/// True if a message should be printed under the given `log_level`.
pub fn should_log(log_level: usize) -> bool {
    log_level > LOG_NOTHING
}

/// True if a progress message concerning a problem of `problem_size`
/// (usually BDD nodes) should be printed under the given `log_level`.
pub fn log_essential(log_level: usize, problem_size: usize) -> bool {
    log_level >= LOG_VERBOSE || (log_level == LOG_ESSENTIAL && problem_size > 100_000)
}

/// A no-op interrupt handler for use with the `_`-prefixed cancellable
/// algorithm variants.
pub fn never_stop() -> Result<(), ()> {
    Ok(())
}

/// A type-safe index of a `Variable` inside a `RegulatoryGraph` (or a `BooleanNetwork`).
///
/// If needed, it can be converted into `usize` for serialisation and safely read
/// again by providing the original `RegulatoryGraph` as context.
///
/// **Warning:** Do not mix type-safe indices between different networks/graphs!
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VariableId(usize);

/// A Boolean variable of a `RegulatoryGraph` (or a `BooleanNetwork`) with a given `name`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Variable {
    name: String,
}

/// Describes an inferred interaction between two variables: `regulator` influences
/// `target` with the given monotonicity `sign` (`None` when the influence is not
/// monotonous).
///
/// Regulations are not declared by the input model. They are derived from the
/// update functions by monotonicity analysis of the function BDDs, hence every
/// regulation stored in a [RegulatoryGraph] is observable by construction.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Regulation {
    regulator: VariableId,
    target: VariableId,
    sign: Option<signed_graph::Sign>,
}

/// A directed graph representing the influences between a collection of Boolean
/// variables.
///
/// The graph is always derived from the update functions of a [BooleanNetwork]
/// (see [BooleanNetwork::infer_regulatory_graph]), so an edge `(regulator, target)`
/// exists exactly when `target`'s function semantically depends on `regulator`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegulatoryGraph {
    variables: Vec<Variable>,
    regulations: Vec<Regulation>,
    variable_to_index: HashMap<String, VariableId>,
}

/// Possible binary Boolean operators that can appear in `FnUpdate`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BinaryOp {
    And,
    Or,
    Xor,
    Iff,
    Imp,
}

/// A Boolean update function formula which references the `Variables`
/// of a `BooleanNetwork`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum FnUpdate {
    /// A true/false constant.
    Const(bool),
    /// References a network variable.
    Var(VariableId),
    /// Negation.
    Not(Box<FnUpdate>),
    /// Binary Boolean operation.
    Binary(BinaryOp, Box<FnUpdate>, Box<FnUpdate>),
}

/// A Boolean network over a fixed collection of variables.
///
/// Each variable can have an update function. A variable *without* an update
/// function is a *free input*: it behaves as if its update function was the
/// identity, i.e. its value never changes but is not fixed to a constant.
/// Uninterpreted parameters are not supported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BooleanNetwork {
    graph: RegulatoryGraph,
    update_functions: Vec<Option<FnUpdate>>,
}

/// An enum representing the possible state of each variable when describing
/// a hypercube.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub enum ExtendedBoolean {
    Zero,
    One,
    Any,
}

/// `Space` represents a hypercube (multi-dimensional rectangle) in the Boolean
/// state space: a partial assignment of network variables.
///
/// Note that there is no way of representing an empty hypercube. Any API that
/// can take/return an empty set has to use `Option<Space>` or similar.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Space(Vec<ExtendedBoolean>);

/// An iterator over all `VariableIds` of a `RegulatoryGraph` (or a `BooleanNetwork`).
pub type VariableIdIterator = Map<Range<usize>, fn(usize) -> VariableId>;

/// An iterator over all `Regulations` of a `RegulatoryGraph`.
pub type RegulationIterator<'a> = std::slice::Iter<'a, Regulation>;
