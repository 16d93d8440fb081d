use crate::{AnalysisError, Space};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Determines how [crate::succession_diagram::SuccessionDiagram::build] explores
/// the diagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpansionStrategy {
    /// Expand every node, breadth-first. Yields the complete diagram.
    Bfs,
    /// Expand every node, depth-first. Same set of nodes as [ExpansionStrategy::Bfs],
    /// different exploration order.
    Dfs,
    /// Expand only until every reachable minimal trap space is materialised
    /// as a node.
    MinimalSpaces,
    /// Expand only nodes whose space contains the given target trap space.
    Target(Space),
    /// Expand using block decomposition: fix source-variable combinations at the
    /// root and afterwards only recurse into a minimal block of each node.
    Blocks,
}

/// Configuration options recognised by the succession diagram and the attractor
/// detection pipeline.
#[derive(Clone, Debug)]
pub struct AnalysisConfig {
    /// Abort diagram expansion once this many nodes exist.
    pub max_sd_nodes: usize,
    /// Abort a symbolic operation once an intermediate BDD exceeds this node count.
    pub max_bdd_size: usize,
    /// Abort attractor candidate generation in a node past this many candidates.
    pub max_candidates: usize,
    /// Abort the expansion of a single node past this many stable motifs.
    pub max_motifs_per_node: usize,
    /// The number of asynchronous steps simulated per candidate in the
    /// cooperative-simulation pruning phase.
    pub simulation_steps: usize,
    /// How many retained sets are sampled when generating attractor candidates
    /// (the sample with the fewest candidates wins).
    pub retained_set_samples: usize,
    /// Enable the Petri-net-unfolding reachability oracle.
    pub pint_reachability: bool,
    /// Enable the symbolic (BDD) reachability oracle.
    pub symbolic_reachability: bool,
    /// Path to the unfolding tool binary. When `None`, the tool is discovered
    /// on `PATH` under the name `pint-reach`.
    pub unfolding_tool: Option<PathBuf>,
    /// Per-query wall-clock budget passed to the trap-space solver (milliseconds).
    pub solver_timeout_ms: Option<u64>,
    /// Per-operation wall-clock budget for expansion and pruning steps.
    pub op_timeout: Option<Duration>,
    /// Seed of the pseudo-random generator used by the retained-set heuristic
    /// and the simulation pruner. Runs with equal configuration are reproducible.
    pub rng_seed: u64,
    /// The expansion strategy applied by `build`.
    pub expansion: ExpansionStrategy,
    /// Emit progress events to stdout.
    pub debug: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            max_sd_nodes: 1 << 20,
            max_bdd_size: 1 << 24,
            max_candidates: 100_000,
            max_motifs_per_node: 100_000,
            simulation_steps: 1024,
            retained_set_samples: 5,
            pint_reachability: true,
            symbolic_reachability: true,
            unfolding_tool: None,
            solver_timeout_ms: None,
            op_timeout: None,
            rng_seed: 0,
            expansion: ExpansionStrategy::Bfs,
            debug: false,
        }
    }
}

impl AnalysisConfig {
    /// The log level implied by this configuration (see [crate::should_log]).
    pub fn log_level(&self) -> usize {
        if self.debug {
            crate::LOG_ESSENTIAL
        } else {
            crate::LOG_NOTHING
        }
    }
}

/// Build an interrupt closure enforcing the given wall-clock budget for the
/// named operation. With `timeout = None` the closure never fails.
pub(crate) fn op_interrupt(
    op: &str,
    timeout: Option<Duration>,
) -> impl Fn() -> Result<(), AnalysisError> {
    let op = op.to_string();
    let deadline = timeout.map(|it| Instant::now() + it);
    move || match deadline {
        Some(deadline) if Instant::now() > deadline => {
            Err(AnalysisError::Timeout { op: op.clone() })
        }
        _ => Ok(()),
    }
}
