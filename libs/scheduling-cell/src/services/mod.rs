pub mod batch;
pub mod exact;
pub mod feasibility;
pub mod greedy;
pub mod policy;
pub mod recommender;
pub mod scoring;
pub mod solver;
pub mod validation;

pub use batch::{BatchOptimizer, BatchResults};
pub use exact::ExactSolver;
pub use feasibility::{check_triple, feasible_candidates, specialty_matches, Infeasibility};
pub use greedy::{greedy_assign, GreedySolver};
pub use policy::{adjust_for_quality_score, Adjustment};
pub use recommender::RecommendationService;
pub use scoring::{score_triple, total_slots};
pub use solver::{
    build_solver, build_solver_with_cancellation, solve_assignment, solve_assignment_with,
    AssignmentSolver, CancellationToken, FallbackSolver,
};
pub use validation::{validate_instance, validate_patient, validate_roster};
