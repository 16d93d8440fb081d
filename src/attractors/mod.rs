//! Attractor identification inside succession diagram nodes.
//!
//! The pipeline has three stages:
//!
//! 1. *Candidate generation* ([candidates]): a retained set over the node's
//!    percolated NFVS turns every attractor into at least one fixed point of
//!    the retained dynamics; the fixed points are enumerated by the trap-space
//!    oracle and form the candidate set.
//! 2. *Cooperative simulation* ([simulation]): randomised asynchronous walks
//!    cheaply eliminate candidates that reach a child trap space or another
//!    candidate.
//! 3. *Exact reachability* ([symbolic] / [unfolding]): the surviving candidates
//!    are certified by symbolic saturation and/or the external Petri-net
//!    unfolding tool, selected by the [ReachabilityOracle] variant. When both
//!    oracles run, their verdicts must agree.

use crate::succession_diagram::{NodeId, SuccessionDiagram};
use crate::symbolic::{Reachability, SymbolicAsyncGraph, VertexSet};
use crate::{config, should_log, AnalysisError, Space};

/// **(internal)** Retained sets and candidate enumeration.
mod candidates;
/// **(internal)** Phase 1: randomised cooperative simulation.
mod simulation;
/// **(internal)** Phase 2: symbolic reachability certification.
mod symbolic;
/// **(internal)** Phase 2: the external unfolding reachability client.
mod unfolding;

pub use unfolding::UnfoldingVerdict;

/// Selects which exact reachability oracle certifies the attractor seeds.
///
/// This is intentionally a closed three-way choice rather than open
/// polymorphism; the [ReachabilityOracle::Both] variant exists to
/// cross-validate the two implementations against each other.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReachabilityOracle {
    Symbolic,
    Unfolding,
    Both,
}

impl ReachabilityOracle {
    /// The oracle selected by the given configuration, or `None` when every
    /// oracle is disabled.
    pub fn from_config(config: &crate::AnalysisConfig) -> Option<ReachabilityOracle> {
        match (config.symbolic_reachability, config.pint_reachability) {
            (true, true) => Some(ReachabilityOracle::Both),
            (true, false) => Some(ReachabilityOracle::Symbolic),
            (false, true) => Some(ReachabilityOracle::Unfolding),
            (false, false) => None,
        }
    }
}

/// Compute the attractor candidate states of the given node (stage 1 plus the
/// retained-set resampling loop).
pub(crate) fn compute_attractor_candidates(
    sd: &mut SuccessionDiagram,
    id: NodeId,
) -> Result<Vec<Space>, AnalysisError> {
    candidates::compute(sd, id)
}

/// Prune the candidate states down to attractor seeds (stages 2 and 3).
///
/// Guarantees of the result: every seed lies in an attractor, and every
/// attractor whose minimal trap space is exactly this node is represented by
/// one seed.
pub(crate) fn prune_candidates(
    sd: &mut SuccessionDiagram,
    id: NodeId,
    candidates: Vec<Space>,
) -> Result<Vec<Space>, AnalysisError> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let child_motifs = child_motifs_reduced(sd, id);
    let pseudo_minimal = child_motifs.is_empty();
    if candidates.len() == 1 && pseudo_minimal {
        // The node must contain at least one attractor, and a single candidate
        // covers them all.
        return Ok(candidates);
    }

    let network = sd.node_percolated_network(id);
    let graph = SymbolicAsyncGraph::new(&network);

    // The states inside the node but outside every child trap space form the
    // terminal restriction space; everything outside of it is to be avoided.
    let node_space = sd.node_space(id).clone();
    let mut avoid = VertexSet::empty(graph.symbolic_context());
    for motif in &child_motifs {
        let motif_states = motif
            .intersect(&node_space)
            .map(|it| graph.mk_subspace(&it))
            .unwrap_or_else(|| graph.mk_empty_vertices());
        avoid = avoid.union(&motif_states);
    }

    // Phase 1: cooperative simulation.
    let mut rng = sd.node_rng(id);
    let steps = sd.config.simulation_steps;
    let log_level = sd.config.log_level();
    let candidates = simulation::prune(&graph, candidates, &avoid, steps, &mut rng, log_level);

    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    if candidates.len() == 1 && pseudo_minimal {
        return Ok(candidates);
    }

    // Phase 2: exact reachability.
    let Some(oracle) = ReachabilityOracle::from_config(&sd.config) else {
        // With no exact oracle enabled we cannot certify anything.
        return Err(AnalysisError::OracleFailure {
            tool: "reachability".to_string(),
            detail: "no reachability oracle is enabled".to_string(),
        });
    };

    phase_two(sd, id, &graph, oracle, candidates, avoid)
}

/// **(internal)** The exact certification loop shared by all oracle variants.
fn phase_two(
    sd: &mut SuccessionDiagram,
    id: NodeId,
    graph: &SymbolicAsyncGraph,
    oracle: ReachabilityOracle,
    candidates: Vec<Space>,
    children_avoid: VertexSet,
) -> Result<Vec<Space>, AnalysisError> {
    let interrupt = config::op_interrupt("attractor certification", sd.config.op_timeout);
    let log_level = sd.config.log_level();

    // Initially avoid all other candidates and the child spaces; candidates
    // are removed from the avoid set as they are processed and confirmed
    // attractors are added back.
    let mut avoid = children_avoid;
    for candidate in &candidates {
        avoid = avoid.union(&graph.mk_subspace(candidate));
    }

    let net = sd.node_percolated_petri_net(id);
    let mut seeds = Vec::new();
    for (index, candidate) in candidates.iter().enumerate() {
        interrupt()?;
        let candidate_set = graph.mk_subspace(candidate);
        avoid = avoid.minus(&candidate_set);

        let symbolic_verdict = match oracle {
            ReachabilityOracle::Symbolic | ReachabilityOracle::Both => Some(
                symbolic::attractor_closure(
                    graph,
                    candidate,
                    &avoid,
                    sd.config.max_bdd_size,
                    log_level,
                    &interrupt,
                )?,
            ),
            ReachabilityOracle::Unfolding => None,
        };

        let unfolding_verdict = match oracle {
            ReachabilityOracle::Unfolding => {
                Some(unfolding::query(&sd.config, &net, &sd.network, candidate, &avoid, graph)?)
            }
            ReachabilityOracle::Both => {
                // With the symbolic verdict available, a failing tool only
                // degrades the cross-validation, so it is treated as unknown.
                match unfolding::query(&sd.config, &net, &sd.network, candidate, &avoid, graph) {
                    Ok(verdict) => Some(verdict),
                    Err(error) if error.is_recoverable() => {
                        if should_log(log_level) {
                            println!("[{}] > Unfolding oracle unavailable: {}.", id, error);
                        }
                        Some(UnfoldingVerdict::Unknown)
                    }
                    Err(fatal) => return Err(fatal),
                }
            }
            ReachabilityOracle::Symbolic => None,
        };

        // The two oracles answer the same question: "can the candidate reach
        // the avoid set". They must agree whenever both produce an answer.
        let is_attractor = match (&symbolic_verdict, &unfolding_verdict) {
            (Some(closure), Some(verdict)) => {
                let symbolic_escapes = closure.is_none();
                match verdict {
                    UnfoldingVerdict::Reachable if !symbolic_escapes => {
                        return Err(AnalysisError::Inconsistent(format!(
                            "candidate {} of node {}: symbolic reports attractor, \
                             unfolding reports escape to the avoid set",
                            index, id
                        )));
                    }
                    UnfoldingVerdict::NotReachable if symbolic_escapes => {
                        return Err(AnalysisError::Inconsistent(format!(
                            "candidate {} of node {}: symbolic reports escape, \
                             unfolding reports the avoid set unreachable",
                            index, id
                        )));
                    }
                    _ => !symbolic_escapes,
                }
            }
            (Some(closure), None) => closure.is_some(),
            (None, Some(UnfoldingVerdict::Reachable)) => false,
            (None, Some(UnfoldingVerdict::NotReachable)) => true,
            (None, Some(UnfoldingVerdict::Unknown)) => {
                // Open question: with symbolic reachability disabled, an
                // inconclusive unfolding answer leaves the node unknown.
                return Err(AnalysisError::OracleFailure {
                    tool: "unfolding".to_string(),
                    detail: format!("inconclusive verdict for candidate {} of node {}", index, id),
                });
            }
            (None, None) => unreachable!("At least one oracle is enabled."),
        };

        if is_attractor {
            if let Some(Some(closure)) = symbolic_verdict {
                // The forward closure of an attractor state is the attractor
                // itself; keeping it in the avoid set prunes every candidate
                // that can reach this attractor.
                avoid = avoid.union(&closure);
            } else {
                avoid = avoid.union(&candidate_set);
            }
            seeds.push(candidate.clone());
        }

        if should_log(log_level) {
            println!(
                "[{}] > Certified candidate {}/{}: attractor = {}.",
                id,
                index + 1,
                candidates.len(),
                is_attractor
            );
        }
    }

    Ok(seeds)
}

/// Compute the symbolic attractor sets for the given seeds: the forward
/// closure of each seed within the node's percolated dynamics.
pub(crate) fn compute_attractor_sets(
    sd: &mut SuccessionDiagram,
    id: NodeId,
    seeds: &[Space],
) -> Result<Vec<VertexSet>, AnalysisError> {
    let network = sd.node_percolated_network(id);
    let graph = SymbolicAsyncGraph::new(&network);
    let interrupt = config::op_interrupt("attractor set computation", sd.config.op_timeout);

    let mut sets = Vec::new();
    for seed in seeds {
        let initial = graph.mk_subspace(seed);
        let closure = Reachability::_reach_fwd(
            &graph,
            &initial,
            sd.config.max_bdd_size,
            sd.config.log_level(),
            &interrupt,
        )?;
        let Some(closure) = closure else {
            return Err(AnalysisError::BudgetExceeded {
                what: format!("attractor set of node {}", id),
                limit: sd.config.max_bdd_size,
            });
        };
        sets.push(closure);
    }
    Ok(sets)
}

/// **(internal)** The reduced stable motifs of the node's children (only the
/// fixings beyond the node's own space). Unexpanded nodes report no motifs.
pub(crate) fn child_motifs_reduced(sd: &SuccessionDiagram, id: NodeId) -> Vec<Space> {
    let Some(children) = sd.node_children(id) else {
        return Vec::new();
    };
    children
        .iter()
        .map(|child| sd.edge_stable_motif(id, *child, true))
        .collect()
}
