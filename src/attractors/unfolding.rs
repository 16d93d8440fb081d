use crate::petri_net::{optimized_dnf, PetriNet};
use crate::symbolic::{SymbolicAsyncGraph, VertexSet};
use crate::{AnalysisConfig, AnalysisError, BooleanNetwork, Space};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// The answer of the external unfolding reachability tool.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnfoldingVerdict {
    Reachable,
    NotReachable,
    /// The tool could not decide the query (static analysis inconclusive,
    /// or the per-call budget expired).
    Unknown,
}

/// The tool can only accept a limited number of goal literals on the command
/// line; larger goals are truncated, which makes the verdict conservative
/// (a truncated goal can only under-approximate reachability, reported
/// as `Unknown` when negative).
const GOAL_SIZE_LIMIT: usize = 8192;

/// The default binary discovered on `PATH` when no explicit tool is configured.
const DEFAULT_TOOL: &str = "pint-reach";

static QUERY_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Ask the external unfolding tool whether `candidate` can reach any state of
/// the `avoid` set within the dynamics of the given (restricted) Petri net.
///
/// The net is exported as an automata-network file; the query then consists of
/// the initial marking (the candidate state projected to the net's variables)
/// and a disjunctive goal extracted from the `avoid` set.
pub(crate) fn query(
    config: &AnalysisConfig,
    net: &PetriNet,
    network: &BooleanNetwork,
    candidate: &Space,
    avoid: &VertexSet,
    graph: &SymbolicAsyncGraph,
) -> Result<UnfoldingVerdict, AnalysisError> {
    if avoid.is_empty() {
        // Nothing can reach a state in an empty set.
        return Ok(UnfoldingVerdict::NotReachable);
    }

    let Some(goal) = build_goal(net, network, avoid, graph) else {
        // The goal did not fit the size limit at all.
        return Ok(UnfoldingVerdict::Unknown);
    };
    let truncated = goal.1;

    let initial = net
        .variables()
        .iter()
        .map(|var| {
            let value = candidate[*var]
                .try_as_bool()
                .expect("Candidates are fully specified states.");
            format!("{}={}", network.get_variable_name(*var), i32::from(value))
        })
        .collect::<Vec<_>>()
        .join(",");

    let model = net.to_automata_network(network);
    let model_path = std::env::temp_dir().join(format!(
        "succession-query-{}-{}.an",
        std::process::id(),
        QUERY_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    std::fs::write(&model_path, model).map_err(|error| AnalysisError::OracleFailure {
        tool: "unfolding".to_string(),
        detail: format!("cannot write the query model: {}", error),
    })?;

    let tool = config
        .unfolding_tool
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL));
    let budget = config.op_timeout.unwrap_or(Duration::from_secs(60));

    let verdict = run_tool(&tool, &model_path, &initial, &goal.0, budget);
    let _ = std::fs::remove_file(&model_path);

    match verdict? {
        // A truncated goal cannot prove unreachability.
        UnfoldingVerdict::NotReachable if truncated => Ok(UnfoldingVerdict::Unknown),
        verdict => Ok(verdict),
    }
}

/// **(internal)** Convert the avoid set into the tool's disjunctive goal
/// syntax: clauses joined by `or`, atoms joined by `and`. Returns the goal and
/// a flag indicating truncation; `None` when not a single clause fits.
fn build_goal(
    net: &PetriNet,
    network: &BooleanNetwork,
    avoid: &VertexSet,
    graph: &SymbolicAsyncGraph,
) -> Option<(String, bool)> {
    let context = graph.symbolic_context();
    let mut clauses = Vec::new();
    let mut remaining = GOAL_SIZE_LIMIT;
    let mut truncated = false;

    for implicant in optimized_dnf(avoid.as_bdd()) {
        let mut atoms = Vec::new();
        for (bdd_var, value) in implicant.to_values() {
            let var = context.find_state_variable(bdd_var).unwrap();
            if !net.variables().contains(&var) {
                // Variables fixed by the enclosing space are implied by the
                // initial marking and need not appear in the goal.
                continue;
            }
            atoms.push(format!(
                "\"{}\"={}",
                network.get_variable_name(var),
                i32::from(value)
            ));
        }
        if atoms.len() > remaining {
            truncated = true;
            break;
        }
        remaining -= atoms.len();
        clauses.push(atoms.join(" and "));
    }

    if clauses.is_empty() {
        return None;
    }
    Some((clauses.join(" or "), truncated))
}

/// **(internal)** Invoke the tool and parse its verdict. The process is killed
/// once the wall-clock budget expires, which reports `Unknown`.
fn run_tool(
    tool: &PathBuf,
    model: &PathBuf,
    initial: &str,
    goal: &str,
    budget: Duration,
) -> Result<UnfoldingVerdict, AnalysisError> {
    let spawned = Command::new(tool)
        .arg(model)
        .arg("--initial")
        .arg(initial)
        .arg("--goal")
        .arg(goal)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(error) if error.kind() == ErrorKind::NotFound => {
            return Err(AnalysisError::OracleFailure {
                tool: tool.display().to_string(),
                detail: "tool binary not found on PATH".to_string(),
            });
        }
        Err(error) => {
            return Err(AnalysisError::OracleFailure {
                tool: tool.display().to_string(),
                detail: format!("cannot spawn the tool: {}", error),
            });
        }
    };

    let deadline = Instant::now() + budget;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    return Err(AnalysisError::OracleFailure {
                        tool: tool.display().to_string(),
                        detail: format!("non-zero exit status: {}", status),
                    });
                }
                break;
            }
            Ok(None) => {
                if Instant::now() > deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Ok(UnfoldingVerdict::Unknown);
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(error) => {
                return Err(AnalysisError::OracleFailure {
                    tool: tool.display().to_string(),
                    detail: format!("cannot wait for the tool: {}", error),
                });
            }
        }
    }

    let mut output = String::new();
    if let Some(mut stdout) = child.stdout.take() {
        use std::io::Read;
        let _ = stdout.read_to_string(&mut output);
    }

    parse_verdict(&output).ok_or_else(|| AnalysisError::OracleFailure {
        tool: tool.display().to_string(),
        detail: format!("unparseable output: `{}`", output.trim()),
    })
}

/// **(internal)** Recognise the verdict in the tool output. Both our canonical
/// `reachable` / `not-reachable` / `unknown` answers and the `True` / `False` /
/// `Inconc` answers of pint-compatible tools are accepted.
fn parse_verdict(output: &str) -> Option<UnfoldingVerdict> {
    let first = output.split_whitespace().next()?.to_lowercase();
    match first.as_str() {
        "reachable" | "true" => Some(UnfoldingVerdict::Reachable),
        "not-reachable" | "unreachable" | "false" => Some(UnfoldingVerdict::NotReachable),
        "unknown" | "inconc" | "inconclusive" => Some(UnfoldingVerdict::Unknown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crate::attractors::unfolding::{parse_verdict, UnfoldingVerdict};

    #[test]
    fn verdict_parsing() {
        assert_eq!(Some(UnfoldingVerdict::Reachable), parse_verdict("reachable\n"));
        assert_eq!(Some(UnfoldingVerdict::Reachable), parse_verdict("True"));
        assert_eq!(
            Some(UnfoldingVerdict::NotReachable),
            parse_verdict("not-reachable")
        );
        assert_eq!(Some(UnfoldingVerdict::NotReachable), parse_verdict("False\n"));
        assert_eq!(Some(UnfoldingVerdict::Unknown), parse_verdict("Inconc"));
        assert_eq!(None, parse_verdict("segmentation fault"));
        assert_eq!(None, parse_verdict(""));
    }
}
