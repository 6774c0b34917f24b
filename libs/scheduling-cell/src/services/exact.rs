// libs/scheduling-cell/src/services/exact.rs
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};

use shared_models::SchedulingError;

use crate::models::{Candidate, SolveOutcome, SolveRequest, SolveStatus, SCORE_TOLERANCE};
use crate::services::feasibility::feasible_candidates;
use crate::services::solver::{AssignmentSolver, CancellationToken};

/// How often a waiting caller re-checks cancellation and the deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Added to every objective coefficient so zero-score candidates still get assigned.
const ASSIGNMENT_BONUS: f64 = 1e-6;

/// Worker threads one solver may have alive at once, abandoned ones included.
/// Past this, solves report `SolverUnavailable` and the fallback takes over.
pub const MAX_RUNNING_SOLVES: usize = 16;

/// Binary MILP over the feasible triples, maximising total score.
///
/// One variable per feasible (patient, doctor, timeslot) triple, one `<= 1` row
/// per patient and one per (doctor, timeslot) pair. The backend runs on its own
/// thread; when the deadline passes or the token is cancelled the caller gets an
/// error straight away and the worker is left to finish in the background.
/// Clones share one count of live workers, capped at [`MAX_RUNNING_SOLVES`].
#[derive(Debug, Clone, Default)]
pub struct ExactSolver {
    timeout: Option<Duration>,
    cancellation: CancellationToken,
    running: Arc<AtomicUsize>,
}

/// Holds one slot of the live-worker count until dropped.
struct RunningSolve(Arc<AtomicUsize>);

impl RunningSolve {
    fn acquire(running: &Arc<AtomicUsize>) -> Result<Self, SchedulingError> {
        let live = running.fetch_add(1, Ordering::SeqCst);
        if live >= MAX_RUNNING_SOLVES {
            running.fetch_sub(1, Ordering::SeqCst);
            return Err(SchedulingError::SolverUnavailable(format!(
                "{} exact solves still running",
                live
            )));
        }
        Ok(Self(Arc::clone(running)))
    }
}

impl Drop for RunningSolve {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ExactSolver {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            timeout,
            cancellation: CancellationToken::new(),
            running: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    /// Whether this build links a MILP backend.
    pub fn is_available() -> bool {
        cfg!(feature = "exact-solver")
    }

    /// Worker threads currently alive for this solver and its clones.
    pub fn running_solves(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    fn run_with_deadline(&self, candidates: Arc<Vec<Candidate>>) -> Result<Vec<usize>, SchedulingError> {
        let guard = RunningSolve::acquire(&self.running)?;
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("exact-solver".to_string())
            .spawn(move || {
                let result = milp::solve(&candidates);
                drop(guard);
                // The receiver is gone if the caller already gave up.
                let _ = tx.send(result);
            })
            .map_err(|e| SchedulingError::Backend(format!("failed to start solver thread: {}", e)))?;

        let deadline = self.timeout.map(|t| Instant::now() + t);

        loop {
            if self.cancellation.is_cancelled() {
                self.log_abandoned("cancelled");
                return Err(SchedulingError::Cancelled);
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.log_abandoned("timed out");
                        return Err(SchedulingError::SolverTimeout {
                            timeout_ms: self.timeout.map_or(0, |t| t.as_millis() as u64),
                        });
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            match rx.recv_timeout(wait) {
                Ok(result) => return result,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SchedulingError::Backend(
                        "solver thread exited without a result".to_string(),
                    ))
                }
            }
        }
    }

    fn log_abandoned(&self, reason: &str) {
        warn!(
            running = self.running_solves(),
            limit = MAX_RUNNING_SOLVES,
            "Exact solve {}, worker left to finish in the background",
            reason
        );
    }
}

impl AssignmentSolver for ExactSolver {
    fn name(&self) -> &'static str {
        "exact"
    }

    #[instrument(skip(self, request), fields(patients = request.patients.len()))]
    fn solve(&self, request: &SolveRequest<'_>) -> Result<SolveOutcome, SchedulingError> {
        if !Self::is_available() {
            return Err(SchedulingError::SolverUnavailable(
                "built without the exact-solver feature".to_string(),
            ));
        }
        if self.cancellation.is_cancelled() {
            return Err(SchedulingError::Cancelled);
        }

        let candidates = Arc::new(feasible_candidates(request));
        if candidates.is_empty() {
            debug!("No feasible triples, skipping MILP");
            return Ok(SolveOutcome::infeasible());
        }

        let start = Instant::now();
        let chosen = self.run_with_deadline(Arc::clone(&candidates))?;
        let chosen = canonicalize_ties(&candidates, chosen);

        info!(
            variables = candidates.len(),
            assigned = chosen.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "MILP solved"
        );

        let chosen = chosen.into_iter().map(|i| candidates[i].clone()).collect();
        Ok(SolveOutcome::from_chosen(chosen, SolveStatus::Optimal))
    }
}

/// Moves each assignment to the lexically smallest equal-score alternative that is still free.
///
/// `candidates` must be sorted by (patient, doctor, timeslot). The objective is unchanged
/// and capacity is preserved. This is a single pass relative to the backend's solution:
/// two optimal solutions that swap equal-score pairs between patients can stay distinct,
/// so repeatable output also relies on the backend being deterministic (microlp is).
fn canonicalize_ties(candidates: &[Candidate], mut chosen: Vec<usize>) -> Vec<usize> {
    fn pair(c: &Candidate) -> (&str, &str) {
        (c.doctor_id.as_str(), c.timeslot_id.as_str())
    }

    chosen.sort_by(|&a, &b| candidates[a].sort_key().cmp(&candidates[b].sort_key()));
    let mut used: BTreeSet<(&str, &str)> = chosen.iter().map(|&i| pair(&candidates[i])).collect();
    let mut canonical = Vec::with_capacity(chosen.len());

    for index in chosen {
        let current = &candidates[index];
        used.remove(&pair(current));

        let best = candidates
            .iter()
            .position(|c| {
                c.patient_id == current.patient_id
                    && (c.score() - current.score()).abs() <= SCORE_TOLERANCE
                    && !used.contains(&pair(c))
            })
            .unwrap_or(index);

        used.insert(pair(&candidates[best]));
        canonical.push(best);
    }

    canonical
}

#[cfg(feature = "exact-solver")]
mod milp {
    use std::collections::BTreeMap;

    use good_lp::{
        constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError,
        Solution, SolverModel, Variable,
    };

    use shared_models::SchedulingError;

    use super::ASSIGNMENT_BONUS;
    use crate::models::Candidate;

    /// Returns the indices of the candidates set to 1 in an optimal solution.
    pub(super) fn solve(candidates: &[Candidate]) -> Result<Vec<usize>, SchedulingError> {
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = problem.add_vector(variable().binary(), candidates.len());

        let objective: Expression = candidates
            .iter()
            .zip(&vars)
            .map(|(c, v)| (c.score() + ASSIGNMENT_BONUS) * *v)
            .sum();

        let mut per_patient: BTreeMap<&str, Vec<Variable>> = BTreeMap::new();
        let mut per_doctor_slot: BTreeMap<(&str, &str), Vec<Variable>> = BTreeMap::new();
        for (c, v) in candidates.iter().zip(&vars) {
            per_patient.entry(c.patient_id.as_str()).or_default().push(*v);
            per_doctor_slot
                .entry((c.doctor_id.as_str(), c.timeslot_id.as_str()))
                .or_default()
                .push(*v);
        }

        let mut model = problem.maximise(objective).using(default_solver);
        for group in per_patient.values().chain(per_doctor_slot.values()) {
            let load: Expression = group.iter().copied().sum();
            model.add_constraint(constraint!(load <= 1));
        }

        match model.solve() {
            Ok(solution) => Ok(vars
                .iter()
                .enumerate()
                .filter(|(_, v)| solution.value(**v) > 0.5)
                .map(|(i, _)| i)
                .collect()),
            Err(ResolutionError::Infeasible) | Err(ResolutionError::Unbounded) => Ok(Vec::new()),
            Err(e) => Err(SchedulingError::Backend(e.to_string())),
        }
    }
}

#[cfg(not(feature = "exact-solver"))]
mod milp {
    use shared_models::SchedulingError;

    use crate::models::Candidate;

    pub(super) fn solve(_candidates: &[Candidate]) -> Result<Vec<usize>, SchedulingError> {
        Err(SchedulingError::SolverUnavailable(
            "built without the exact-solver feature".to_string(),
        ))
    }
}
