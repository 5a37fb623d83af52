//! Runs the build, solve and extract pipeline for every vendor in a catalog
//! and picks the cheapest feasible order.

use feastplan_solver::{MilpSolver, SolutionStatus};
use thiserror::Error;

use crate::builder::build_model;
use crate::constraints::ConstraintSpec;
use crate::error::PlanError;
use crate::extract::{extract, VendorResult};
use crate::menu::{Catalog, Vendor};

/// Why a vendor produced no result
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureReason {
    #[error("no combination of items satisfies the constraints")]
    Infeasible,
    #[error("solver reported an unbounded model")]
    Unbounded,
    #[error("solver failed: {0}")]
    Solver(String),
    #[error("menu rejected: {0}")]
    InvalidMenu(String),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VendorFailure {
    pub vendor: String,
    pub reason: FailureReason,
}

/// Results of a run in which at least one vendor was feasible
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// One entry per feasible vendor, in catalog order
    pub results: Vec<VendorResult>,
    /// Lowest total cost; the earliest vendor wins ties
    pub cheapest: VendorResult,
    /// Vendors that produced no result, in catalog order
    pub failures: Vec<VendorFailure>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Solved(RunResult),
    /// No vendor admits a satisfying order
    NoSolution { failures: Vec<VendorFailure> },
}

impl FailureReason {
    /// True for the expected "nothing fits" outcome, false for faults.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, FailureReason::Infeasible)
    }
}

impl RunOutcome {
    pub fn cheapest(&self) -> Option<&VendorResult> {
        match self {
            RunOutcome::Solved(run) => Some(&run.cheapest),
            RunOutcome::NoSolution { .. } => None,
        }
    }

    pub fn results(&self) -> &[VendorResult] {
        match self {
            RunOutcome::Solved(run) => &run.results,
            RunOutcome::NoSolution { .. } => &[],
        }
    }

    pub fn failures(&self) -> &[VendorFailure] {
        match self {
            RunOutcome::Solved(run) => &run.failures,
            RunOutcome::NoSolution { failures } => failures,
        }
    }
}

/// Lowest-cost result; on equal cost the earliest entry wins.
///
/// Costs are compared in whole cents, so equal orders tie exactly.
pub fn cheapest(results: &[VendorResult]) -> Option<&VendorResult> {
    results.iter().fold(None, |best: Option<&VendorResult>, candidate| match best {
        Some(b) if b.total_cents <= candidate.total_cents => Some(b),
        _ => Some(candidate),
    })
}

/// Compares vendors through any [`MilpSolver`] backend.
pub struct Comparator<'a, S: ?Sized> {
    solver: &'a S,
}

impl<'a, S: MilpSolver + ?Sized> Comparator<'a, S> {
    pub fn new(solver: &'a S) -> Self {
        Self { solver }
    }

    /// Solve every vendor in catalog order and select the cheapest.
    ///
    /// Only request-wide problems (an invalid constraint set, duplicate
    /// vendor names) return `Err`. Anything that goes wrong for a single
    /// vendor is recorded in the failures and the run carries on.
    pub fn run(&self, catalog: &Catalog, spec: &ConstraintSpec) -> Result<RunOutcome, PlanError> {
        spec.validate()?;
        catalog.validate()?;

        let mut results = Vec::new();
        let mut failures = Vec::new();

        for vendor in &catalog.vendors {
            match self.solve_vendor(vendor, spec) {
                Ok(result) => results.push(result),
                Err(reason) => failures.push(VendorFailure {
                    vendor: vendor.name.clone(),
                    reason,
                }),
            }
        }

        let Some(best) = cheapest(&results).cloned() else {
            log::info!("no vendor can satisfy the request");
            return Ok(RunOutcome::NoSolution { failures });
        };

        log::info!("cheapest vendor is {} at {:.2}", best.vendor, best.total_cost);
        Ok(RunOutcome::Solved(RunResult {
            results,
            cheapest: best,
            failures,
        }))
    }

    /// Run the pipeline for one vendor.
    pub fn solve_vendor(&self, vendor: &Vendor, spec: &ConstraintSpec) -> Result<VendorResult, FailureReason> {
        let model = build_model(vendor, spec).map_err(|e| {
            log::warn!("skipping {}: {}", vendor.name, e);
            FailureReason::InvalidMenu(e.to_string())
        })?;

        let solution = self.solver.solve(&model.problem);

        let reason = match solution.status {
            SolutionStatus::Optimal => match extract(&model, &solution) {
                Ok(Some(result)) => {
                    log::info!("{} can cater for {:.2}", result.vendor, result.total_cost);
                    return Ok(result);
                }
                Ok(None) => FailureReason::Solver("optimal status without an assignment".to_string()),
                Err(e) => FailureReason::Solver(e.to_string()),
            },
            SolutionStatus::Infeasible => {
                log::debug!("{} is infeasible", vendor.name);
                return Err(FailureReason::Infeasible);
            }
            SolutionStatus::Unbounded => FailureReason::Unbounded,
            SolutionStatus::Error => FailureReason::Solver(
                solution
                    .message
                    .unwrap_or_else(|| "unknown solver error".to_string()),
            ),
        };

        log::warn!("{}: {}", vendor.name, reason);
        Err(reason)
    }
}
