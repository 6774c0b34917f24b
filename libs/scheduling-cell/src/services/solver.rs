// libs/scheduling-cell/src/services/solver.rs
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use shared_config::{AppConfig, SolverStrategyKind};
use shared_models::{BlockSet, Doctor, Patient, SchedulingError, Timeslot, Weights};

use crate::models::{SolveOutcome, SolveRequest};
use crate::services::exact::ExactSolver;
use crate::services::greedy::GreedySolver;
use crate::services::validation::validate_instance;

/// A way of turning a [`SolveRequest`] into a capacity-respecting set of assignments.
pub trait AssignmentSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolveOutcome, SchedulingError>;
}

/// Caller-owned flag that stops in-flight exact solves.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Exact solve first; greedy when the backend is missing or runs out of time.
pub struct FallbackSolver {
    exact: ExactSolver,
    greedy: GreedySolver,
}

impl FallbackSolver {
    pub fn new(exact: ExactSolver) -> Self {
        Self {
            exact,
            greedy: GreedySolver,
        }
    }
}

impl AssignmentSolver for FallbackSolver {
    fn name(&self) -> &'static str {
        "exact+greedy"
    }

    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolveOutcome, SchedulingError> {
        match self.exact.solve(request) {
            Err(e) if e.is_recoverable_by_fallback() => {
                warn!("{}; falling back to greedy assignment", e);
                self.greedy.solve(request)
            }
            other => other,
        }
    }
}

/// Picks the configured strategy. Exact always runs behind the greedy fallback.
pub fn build_solver(config: &AppConfig) -> Arc<dyn AssignmentSolver> {
    build_solver_with_cancellation(config, CancellationToken::new())
}

pub fn build_solver_with_cancellation(
    config: &AppConfig,
    cancellation: CancellationToken,
) -> Arc<dyn AssignmentSolver> {
    match config.solver_strategy {
        SolverStrategyKind::Exact => Arc::new(FallbackSolver::new(
            ExactSolver::new(config.exact_timeout()).with_cancellation(cancellation),
        )),
        SolverStrategyKind::Greedy => Arc::new(GreedySolver),
    }
}

/// Solves one assignment problem over the whole roster with the default configuration.
pub fn solve_assignment(
    patients: &[Patient],
    doctors: &[Doctor],
    timeslots: &[Timeslot],
    weights: &Weights,
    blocked: &BlockSet,
) -> Result<SolveOutcome, SchedulingError> {
    solve_assignment_with(
        build_solver(&AppConfig::default()).as_ref(),
        patients,
        doctors,
        timeslots,
        weights,
        blocked,
    )
}

/// Validates the instance then runs `solver` on it.
pub fn solve_assignment_with(
    solver: &dyn AssignmentSolver,
    patients: &[Patient],
    doctors: &[Doctor],
    timeslots: &[Timeslot],
    weights: &Weights,
    blocked: &BlockSet,
) -> Result<SolveOutcome, SchedulingError> {
    validate_instance(patients, doctors, timeslots, weights)?;

    let start = Instant::now();
    let request = SolveRequest::new(patients, doctors, timeslots, *weights, blocked);
    let outcome = solver.solve(&request)?;

    info!(
        solver = solver.name(),
        status = %outcome.status,
        assigned = outcome.assignments.len(),
        objective = outcome.objective,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Assignment solve finished for {} patients",
        patients.len()
    );

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn strategy_follows_config() {
        let exact = build_solver(&AppConfig::default());
        assert_eq!(exact.name(), "exact+greedy");

        let greedy = build_solver(&AppConfig {
            solver_strategy: SolverStrategyKind::Greedy,
            ..AppConfig::default()
        });
        assert_eq!(greedy.name(), "greedy");
    }
}
