use thiserror::Error;

/// Represents a linear program, optionally with integer-valued variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Integrality marker for each variable
    pub integer: Vec<bool>,
    /// Objective function coefficients (costs)
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

/// Information about a violated constraint
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct ConstraintViolation {
    /// Constraint name
    pub constraint: String,
    /// Required value (from constraint RHS)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

/// Structural problems that make a model unsolvable regardless of its data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("{name} has {got} coefficients but the problem has {expected} variables")]
    DimensionMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("{0} contains a non-finite value")]
    NonFinite(String),
}

impl ConstraintOp {
    /// The operator obtained by multiplying both sides by -1.
    pub fn flipped(self) -> Self {
        match self {
            ConstraintOp::Le => ConstraintOp::Ge,
            ConstraintOp::Ge => ConstraintOp::Le,
            ConstraintOp::Eq => ConstraintOp::Eq,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ConstraintOp::Le => "<=",
            ConstraintOp::Ge => ">=",
            ConstraintOp::Eq => "=",
        }
    }
}

impl Constraint {
    /// Evaluate the left-hand side at `values`.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            integer: vec![false; n],
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    /// Mark every variable as integer-valued.
    pub fn set_all_integer(&mut self) {
        self.integer = vec![true; self.variables.len()];
    }

    pub fn is_integer(&self, index: usize) -> bool {
        self.integer.get(index).copied().unwrap_or(false)
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value at `values`, computed from the objective coefficients.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Check that every coefficient vector matches the variable count and
    /// that no coefficient or right-hand side is NaN or infinite.
    pub fn validate(&self) -> Result<(), ProblemError> {
        let expected = self.num_variables();
        let check = |name: &str, len: usize| {
            if len == expected {
                Ok(())
            } else {
                Err(ProblemError::DimensionMismatch {
                    name: name.to_string(),
                    expected,
                    got: len,
                })
            }
        };

        check("integrality markers", self.integer.len())?;
        check("objective", self.objective.coefficients.len())?;
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ProblemError::NonFinite("objective".to_string()));
        }

        for c in &self.constraints {
            check(&c.name, c.coefficients.len())?;
            if !c.rhs.is_finite() || c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(ProblemError::NonFinite(c.name.clone()));
            }
        }
        Ok(())
    }

    /// Find which constraints are violated by a given assignment, worst first.
    /// Negative variable values are reported as violations of implicit
    /// non-negativity.
    pub fn violations(&self, values: &[f64], tolerance: f64) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        for (name, &value) in self.variables.iter().zip(values) {
            if value < -tolerance {
                violations.push(ConstraintViolation {
                    constraint: format!("{}_nonneg", name),
                    required: 0.0,
                    actual: value,
                    violation_amount: -value,
                    description: format!("{} is negative ({:.2})", name, value),
                });
            }
        }

        for c in &self.constraints {
            let lhs = c.lhs(values);

            let violation = match c.op {
                ConstraintOp::Le if lhs > c.rhs + tolerance => {
                    let amt = lhs - c.rhs;
                    Some((amt, format!("{} exceeds maximum of {:.2} by {:.2}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Ge if lhs < c.rhs - tolerance => {
                    let amt = c.rhs - lhs;
                    Some((amt, format!("{} is below minimum of {:.2} by {:.2}", c.name, c.rhs, amt)))
                }
                ConstraintOp::Eq if (lhs - c.rhs).abs() > tolerance => {
                    let diff = (lhs - c.rhs).abs();
                    Some((diff, format!("{} requires exactly {:.2} but got {:.2}", c.name, c.rhs, lhs)))
                }
                _ => None,
            };

            if let Some((violation_amount, description)) = violation {
                violations.push(ConstraintViolation {
                    constraint: c.name.clone(),
                    required: c.rhs,
                    actual: lhs,
                    violation_amount,
                    description,
                });
            }
        }

        violations.sort_by(|a, b| b.violation_amount.total_cmp(&a.violation_amount));
        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_var_problem() -> LpProblem {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 2.0], true);
        problem.add_constraint("cover", vec![2.0, 3.0], ConstraintOp::Ge, 6.0);
        problem.add_constraint("cap", vec![1.0, 1.0], ConstraintOp::Le, 4.0);
        problem
    }

    #[test]
    fn test_validate_accepts_consistent_problem() {
        assert_eq!(two_var_problem().validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_short_constraint() {
        let mut problem = two_var_problem();
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 1.0);

        let err = problem.validate().unwrap_err();
        assert_eq!(
            err,
            ProblemError::DimensionMismatch {
                name: "short".to_string(),
                expected: 2,
                got: 1,
            }
        );
    }

    #[test]
    fn test_validate_rejects_nan_rhs() {
        let mut problem = two_var_problem();
        problem.add_constraint("bad", vec![1.0, 1.0], ConstraintOp::Le, f64::NAN);
        assert_eq!(problem.validate(), Err(ProblemError::NonFinite("bad".to_string())));
    }

    #[test]
    fn test_violations_sorted_worst_first() {
        let problem = two_var_problem();
        // cover: 2*0 + 3*0 = 0, short by 6. cap satisfied.
        let violations = problem.violations(&[0.0, 0.0], 1e-9);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, "cover");
        assert_eq!(violations[0].violation_amount, 6.0);

        // cover satisfied, cap exceeded by 1
        let violations = problem.violations(&[5.0, 0.0], 1e-9);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].constraint, "cap");
    }

    #[test]
    fn test_violations_report_negative_values() {
        let problem = two_var_problem();
        let violations = problem.violations(&[4.5, -0.5], 1e-9);
        assert!(violations.iter().any(|v| v.constraint == "y_nonneg"));
    }

    #[test]
    fn test_objective_value_and_integrality() {
        let mut problem = two_var_problem();
        assert!(!problem.is_integer(0));
        problem.set_all_integer();
        assert!(problem.is_integer(1));
        assert!(!problem.is_integer(7));
        assert_eq!(problem.objective_value(&[1.0, 2.0]), 5.0);
    }
}
