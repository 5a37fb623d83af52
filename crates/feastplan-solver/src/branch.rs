use std::time::{Duration, Instant};

use crate::problem::{ConstraintOp, LpProblem};
use crate::simplex::Simplex;
use crate::solution::{Solution, SolutionStatus};
use crate::MilpSolver;

/// Wall-clock budget applied unless another one is configured
pub const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(30);

/// Depth-first branch and bound over [`Simplex`] relaxations.
///
/// Each node adds single-variable bounds to the original problem. The node
/// and time limits bound the running time; exceeding either one yields an
/// `Error` status even if an incumbent exists, since optimality is unproven.
/// When every objective term is an integer coefficient on an integer
/// variable, relaxation bounds are rounded up before pruning.
#[derive(Debug, Clone)]
pub struct BranchAndBound {
    simplex: Simplex,
    /// Maximum relaxations solved before giving up
    max_nodes: usize,
    /// Optional wall-clock budget for one solve
    time_limit: Option<Duration>,
    /// Distance from an integer below which a value counts as integral
    integrality_tolerance: f64,
}

impl Default for BranchAndBound {
    fn default() -> Self {
        Self {
            simplex: Simplex::default(),
            max_nodes: 100_000,
            time_limit: Some(DEFAULT_TIME_LIMIT),
            integrality_tolerance: 1e-6,
        }
    }
}

/// A single-variable bound added while branching
#[derive(Debug, Clone, Copy)]
struct Bound {
    index: usize,
    op: ConstraintOp,
    value: f64,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_simplex(mut self, simplex: Simplex) -> Self {
        self.simplex = simplex;
        self
    }

    pub fn with_max_nodes(mut self, max: usize) -> Self {
        self.max_nodes = max;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn without_time_limit(mut self) -> Self {
        self.time_limit = None;
        self
    }

    pub fn with_integrality_tolerance(mut self, tol: f64) -> Self {
        self.integrality_tolerance = tol;
        self
    }

    /// Most fractional integer variable in `values`, lowest index on ties.
    fn branching_variable(&self, problem: &LpProblem, values: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (index, &value) in values.iter().enumerate() {
            if !problem.is_integer(index) {
                continue;
            }
            let distance = (value - value.round()).abs();
            if distance <= self.integrality_tolerance {
                continue;
            }
            if best.is_none_or(|(_, _, d)| distance > d) {
                best = Some((index, value, distance));
            }
        }
        best.map(|(index, value, _)| (index, value))
    }

    /// Integer variable furthest from an integer, even within tolerance.
    fn least_integral(problem: &LpProblem, values: &[f64]) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64, f64)> = None;
        for (index, &value) in values.iter().enumerate() {
            let distance = (value - value.round()).abs();
            if problem.is_integer(index) && distance > 0.0 && best.is_none_or(|(_, _, d)| distance > d) {
                best = Some((index, value, distance));
            }
        }
        best.map(|(index, value, _)| (index, value))
    }

    /// Whether every feasible integer point has an integer objective value.
    fn has_integral_objective(problem: &LpProblem) -> bool {
        problem
            .objective
            .coefficients
            .iter()
            .enumerate()
            .all(|(i, &c)| c == 0.0 || (problem.is_integer(i) && c.fract() == 0.0))
    }

    /// Round integer-marked variables to their nearest integer.
    fn snap(&self, problem: &LpProblem, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| if problem.is_integer(i) { v.round() } else { v })
            .collect()
    }

    fn with_bounds(problem: &LpProblem, bounds: &[Bound]) -> LpProblem {
        let mut node = problem.clone();
        let n = problem.num_variables();
        for bound in bounds {
            let mut coeffs = vec![0.0; n];
            coeffs[bound.index] = 1.0;
            node.add_constraint(
                format!("{}_branch_{}", problem.variables[bound.index], bound.op.symbol()),
                coeffs,
                bound.op,
                bound.value,
            );
        }
        node
    }
}

impl MilpSolver for BranchAndBound {
    fn solve(&self, problem: &LpProblem) -> Solution {
        if let Err(e) = problem.validate() {
            return Solution::error(e.to_string());
        }

        let started = Instant::now();
        // Internally everything is minimized
        let sense = if problem.objective.minimize { 1.0 } else { -1.0 };
        let feasibility_tolerance = self.integrality_tolerance;
        let integral_objective = Self::has_integral_objective(problem);

        let mut incumbent: Option<(Vec<f64>, f64)> = None;
        let mut stack: Vec<Vec<Bound>> = vec![Vec::new()];
        let mut explored = 0usize;

        while let Some(bounds) = stack.pop() {
            if explored >= self.max_nodes {
                return Solution::error(format!("node limit of {} reached", self.max_nodes));
            }
            if let Some(limit) = self.time_limit
                && started.elapsed() >= limit
            {
                return Solution::error(format!("time limit of {} ms reached", limit.as_millis()));
            }
            explored += 1;

            let node = Self::with_bounds(problem, &bounds);
            let relaxation = self.simplex.solve(&node);
            match relaxation.status {
                SolutionStatus::Optimal => {}
                SolutionStatus::Infeasible => continue,
                SolutionStatus::Unbounded => return Solution::unbounded(),
                SolutionStatus::Error => return relaxation,
            }

            let mut bound = sense * relaxation.objective_value;
            if integral_objective {
                // No integer point below this node can beat the next integer
                bound = (bound - self.simplex.tolerance() * bound.abs().max(1.0)).ceil();
            }
            if let Some((_, best)) = &incumbent
                && bound >= *best - self.simplex.tolerance() * best.abs().max(1.0)
            {
                continue;
            }

            let branch = match self.branching_variable(problem, &relaxation.values) {
                Some(found) => found,
                None => {
                    let values = self.snap(problem, &relaxation.values);
                    if problem.violations(&values, feasibility_tolerance).is_empty() {
                        let objective = sense * problem.objective_value(&values);
                        incumbent = Some((values, objective));
                        continue;
                    }
                    // Rounding broke a row, so split on the least integral value
                    let Some(found) = Self::least_integral(problem, &relaxation.values) else {
                        log::debug!("discarding node {explored}: integral point violates the model");
                        continue;
                    };
                    found
                }
            };

            let (index, value) = branch;
            let mut up = bounds.clone();
            up.push(Bound {
                index,
                op: ConstraintOp::Ge,
                value: value.ceil(),
            });
            let mut down = bounds;
            down.push(Bound {
                index,
                op: ConstraintOp::Le,
                value: value.floor(),
            });
            // Floor branch is explored first
            stack.push(up);
            stack.push(down);
        }

        log::debug!("branch and bound explored {explored} nodes");

        match incumbent {
            Some((values, _)) => {
                let objective_value = problem.objective_value(&values);
                Solution::optimal(values, objective_value)
            }
            None => Solution::infeasible(),
        }
    }
}
