use thiserror::Error;

/// Errors reported by the analysis operations.
///
/// Note that [AnalysisError::BudgetExceeded], [AnalysisError::OracleFailure] and
/// [AnalysisError::Timeout] are *recoverable*: the succession diagram catches them
/// during expansion or attractor detection, marks the affected node and continues
/// with the remaining branches. Only [AnalysisError::Inconsistent] and
/// [AnalysisError::MalformedInput] propagate to the caller.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A configurable resource cap was hit. Recoverable by raising the cap or
    /// narrowing the scope of the query.
    #[error("budget exceeded: {what} (limit {limit})")]
    BudgetExceeded { what: String, limit: usize },
    /// An external tool returned unparseable output or a non-zero status.
    #[error("oracle `{tool}` failed: {detail}")]
    OracleFailure { tool: String, detail: String },
    /// A per-call wall-clock budget was exceeded.
    #[error("operation `{op}` timed out")]
    Timeout { op: String },
    /// The symbolic and unfolding reachability oracles disagree. This is fatal,
    /// as it indicates an implementation bug; the message carries the diagnostic
    /// state of both queries.
    #[error("reachability oracles disagree: {0}")]
    Inconsistent(String),
    /// The input network description could not be processed.
    #[error("malformed input: {0}")]
    MalformedInput(String),
}

impl AnalysisError {
    /// True for error variants that expansion and attractor search absorb
    /// into node state instead of propagating.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnalysisError::BudgetExceeded { .. }
                | AnalysisError::OracleFailure { .. }
                | AnalysisError::Timeout { .. }
        )
    }
}
