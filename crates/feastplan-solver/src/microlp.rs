use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution as _, SolverModel,
    Variable,
};

use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::Solution;
use crate::MilpSolver;

/// [`MilpSolver`] backed by the pure-Rust `microlp` engine through `good_lp`.
///
/// Every variable is bounded below by zero. Integer-marked variables are
/// declared integral and their values are rounded on the way out.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLp;

impl MicroLp {
    pub fn new() -> Self {
        Self
    }
}

fn linear(coefficients: &[f64], columns: &[Variable]) -> Expression {
    coefficients
        .iter()
        .zip(columns)
        .filter(|&(&c, _)| c != 0.0)
        .fold(Expression::from(0.0), |acc, (&c, &v)| acc + c * v)
}

/// Whether `0 op rhs` holds, for rows with no non-zero coefficient
fn constant_row_holds(op: ConstraintOp, rhs: f64) -> bool {
    match op {
        ConstraintOp::Le => rhs >= 0.0,
        ConstraintOp::Ge => rhs <= 0.0,
        ConstraintOp::Eq => rhs == 0.0,
    }
}

impl MilpSolver for MicroLp {
    fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            return Solution::error(e.to_string());
        }

        // Rows without a variable are decided here; the engine never sees them
        let mut rows = Vec::with_capacity(problem.num_constraints());
        for c in &problem.constraints {
            if c.coefficients.iter().all(|&v| v == 0.0) {
                if !constant_row_holds(c.op, c.rhs) {
                    log::debug!("{} can never hold", c.name);
                    return Solution::infeasible();
                }
            } else {
                rows.push(c);
            }
        }

        if problem.num_variables() == 0 {
            return Solution::optimal(Vec::new(), 0.0);
        }

        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = problem
            .variables
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let definition = variable().min(0.0).name(name.clone());
                vars.add(if problem.is_integer(i) {
                    definition.integer()
                } else {
                    definition
                })
            })
            .collect();

        let objective = linear(&problem.objective.coefficients, &columns);
        let unsolved = if problem.objective.minimize {
            vars.minimise(objective)
        } else {
            vars.maximise(objective)
        };

        let mut model = unsolved.using(microlp);
        for c in rows {
            let lhs = linear(&c.coefficients, &columns);
            let rhs = Expression::from(c.rhs);
            model = model.with(match c.op {
                ConstraintOp::Le => constraint::leq(lhs, rhs),
                ConstraintOp::Ge => constraint::geq(lhs, rhs),
                ConstraintOp::Eq => constraint::eq(lhs, rhs),
            });
        }

        log::debug!(
            "solving {} variables and {} rows with microlp",
            columns.len(),
            problem.num_constraints()
        );

        match model.solve() {
            Ok(found) => {
                let values: Vec<f64> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, &column)| {
                        let value = found.value(column);
                        if problem.is_integer(i) { value.round() } else { value }
                    })
                    .collect();
                let objective_value = problem.objective_value(&values);
                Solution::optimal(values, objective_value)
            }
            Err(ResolutionError::Infeasible) => Solution::infeasible(),
            Err(ResolutionError::Unbounded) => Solution::unbounded(),
            Err(e) => Solution::error(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::BranchAndBound;
    use crate::solution::SolutionStatus;
    use rstest::rstest;

    fn covering_problem(people: f64, budget: f64, cap: f64) -> LpProblem {
        // Two dishes: serves 2 for 18, serves 3 for 28
        let mut problem = LpProblem::new(vec!["small".to_string(), "large".to_string()]);
        problem.set_objective(vec![18.0, 28.0], true);
        problem.add_constraint("people", vec![2.0, 3.0], ConstraintOp::Ge, people);
        problem.add_constraint("budget", vec![18.0, 28.0], ConstraintOp::Le, budget);
        problem.add_constraint("small_max", vec![1.0, 0.0], ConstraintOp::Le, cap);
        problem.add_constraint("large_max", vec![0.0, 1.0], ConstraintOp::Le, cap);
        problem.set_all_integer();
        problem
    }

    #[test]
    fn test_integer_covering() {
        let solution = MicroLp::new().solve(&covering_problem(7.0, 1000.0, 10.0));

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.values, vec![2.0, 1.0]);
        assert_eq!(solution.objective_value, 64.0);
    }

    #[rstest]
    #[case::over_budget(7.0, 50.0, 10.0)]
    #[case::repeat_cap_too_low(7.0, 1000.0, 1.0)]
    #[case::nothing_allowed(1.0, 1000.0, 0.0)]
    fn test_integer_infeasible(#[case] people: f64, #[case] budget: f64, #[case] cap: f64) {
        let solution = MicroLp::new().solve(&covering_problem(people, budget, cap));

        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_row_without_variables() {
        let mut problem = covering_problem(7.0, 1000.0, 10.0);
        problem.add_constraint("halal", vec![0.0, 0.0], ConstraintOp::Ge, 1.0);
        assert_eq!(MicroLp::new().solve(&problem).status, SolutionStatus::Infeasible);

        let mut problem = covering_problem(7.0, 1000.0, 10.0);
        problem.add_constraint("halal", vec![0.0, 0.0], ConstraintOp::Ge, 0.0);
        assert_eq!(MicroLp::new().solve(&problem).status, SolutionStatus::Optimal);
    }

    #[test]
    fn test_maximization() {
        // Maximize 5x + 4y, 6x + 4y <= 24, x + 2y <= 6, integers -> 20
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![5.0, 4.0], false);
        problem.add_constraint("c1", vec![6.0, 4.0], ConstraintOp::Le, 24.0);
        problem.add_constraint("c2", vec![1.0, 2.0], ConstraintOp::Le, 6.0);
        problem.set_all_integer();

        let solution = MicroLp::new().solve(&problem);

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert_eq!(solution.objective_value, 20.0);
    }

    #[test]
    fn test_malformed_problem_is_an_error() {
        let mut problem = covering_problem(7.0, 1000.0, 10.0);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0);

        assert_eq!(MicroLp::new().solve(&problem).status, SolutionStatus::Error);
    }

    #[test]
    fn test_no_variables() {
        let problem = LpProblem::new(Vec::new());
        let solution = MicroLp::new().solve(&problem);
        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!(solution.values.is_empty());
    }

    #[rstest]
    #[case(7.0, 10.0)]
    #[case(11.0, 3.0)]
    #[case(20.0, 5.0)]
    #[case(30.0, 10.0)]
    fn test_agrees_with_branch_and_bound(#[case] people: f64, #[case] cap: f64) {
        let problem = covering_problem(people, 1000.0, cap);

        let ours = MicroLp::new().solve(&problem);
        let reference = BranchAndBound::new().solve(&problem);

        assert_eq!(ours.status, reference.status);
        assert_eq!(ours.objective_value, reference.objective_value);
    }
}
