mod branch;
mod microlp;
mod problem;
mod simplex;
mod solution;

pub use branch::BranchAndBound;
pub use microlp::MicroLp;
pub use problem::{Constraint, ConstraintOp, ConstraintViolation, LpProblem, Objective, ProblemError};
pub use simplex::Simplex;
pub use solution::{Solution, SolutionStatus};

/// A backend able to solve linear programs whose variables may be marked integral.
///
/// The menu planner only talks to solvers through this trait. [`MicroLp`]
/// wraps an external engine and [`BranchAndBound`] is a self-contained
/// fallback; any other MILP-capable engine can stand in. Implementations
/// must report every failure through [`SolutionStatus`] rather than panicking.
pub trait MilpSolver: Send + Sync {
    /// Solve `problem`, honouring the integrality markers on its variables.
    fn solve(&self, problem: &LpProblem) -> Solution;
}
