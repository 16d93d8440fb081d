//! A fully symbolic representation of the asynchronous state-transition graph
//! of a Boolean network.
//!
//! Internally, every network variable maps to one BDD variable of a shared
//! [biodivine_lib_bdd::BddVariableSet] with a fixed global ordering (the
//! [SymbolicContext]). Subsets of the state space are represented as
//! [VertexSet] objects. The [SymbolicAsyncGraph] then provides the standard
//! `post`/`pre` exploration operators, subspace construction, percolation
//! and saturation-based reachability.

use crate::BooleanNetwork;
use biodivine_lib_bdd::{Bdd, BddVariable, BddVariableSet};

/// **(internal)** Utility methods for `SymbolicAsyncGraph`.
mod _impl_symbolic_async_graph;
/// **(internal)** Utility methods for `SymbolicContext`.
mod _impl_symbolic_context;
/// **(internal)** Set operations for `VertexSet`.
mod _impl_vertex_set;
/// Saturation-based forward/backward reachability.
pub mod reachability;

pub use reachability::Reachability;

/// Symbolic context manages the mapping between the variables of a Boolean
/// network and the `BddVariables` used by `lib-bdd`.
#[derive(Clone)]
pub struct SymbolicContext {
    bdd: BddVariableSet,
    state_variables: Vec<BddVariable>,
}

/// Symbolic representation of a set of network states (vertices of the
/// state-transition graph).
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct VertexSet {
    bdd: Bdd,
}

/// A symbolic encoding of the asynchronous transition system of a
/// `BooleanNetwork`.
///
/// Provides standard pre/post operations for exploring the graph symbolically.
#[derive(Clone)]
pub struct SymbolicAsyncGraph {
    network: BooleanNetwork,
    context: SymbolicContext,
    // Empty and unit vertex set.
    vertex_space: (VertexSet, VertexSet),
    // A `Bdd` which stores the exact asynchronous update function `f_i(x)`
    // for each variable `x_i`.
    fn_update: Vec<Bdd>,
    // For every update function, stores `x_i != f_i(x)`. In other words, this
    // is the symbolic set of states where a transition of `x_i` is enabled.
    fn_transition: Vec<Bdd>,
}
