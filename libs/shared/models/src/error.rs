use thiserror::Error;

/// Failures surfaced by the scheduling engine.
///
/// An infeasible instance is not an error: it is reported as an empty
/// recommendation list or an `Infeasible` solve status.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Exact solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Patient not found: {0}")]
    PatientNotFound(String),

    #[error("Exact solver timed out after {timeout_ms} ms")]
    SolverTimeout { timeout_ms: u64 },

    #[error("Solve cancelled by caller")]
    Cancelled,

    #[error("Solver backend error: {0}")]
    Backend(String),
}

impl SchedulingError {
    /// Errors that the exact strategy recovers from by running the greedy solver.
    pub fn is_recoverable_by_fallback(&self) -> bool {
        matches!(
            self,
            SchedulingError::SolverUnavailable(_) | SchedulingError::SolverTimeout { .. }
        )
    }
}
