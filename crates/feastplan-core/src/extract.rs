use feastplan_solver::Solution;

use crate::builder::MenuModel;
use crate::error::PlanError;
use crate::money;

/// Largest distance from the model's constraints tolerated after rounding
const ASSIGNMENT_TOLERANCE: f64 = 1e-6;

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ChosenItem {
    pub name: String,
    pub quantity: u32,
}

/// The cheapest order found at one vendor
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VendorResult {
    pub vendor: String,
    /// Sum of price times quantity over `items`, in cents
    pub total_cents: u64,
    /// `total_cents` in currency units
    pub total_cost: f64,
    /// Items with a positive quantity, in menu order
    pub items: Vec<ChosenItem>,
}

impl VendorResult {
    pub fn quantity_of(&self, item: &str) -> u32 {
        self.items
            .iter()
            .find(|c| c.name == item)
            .map(|c| c.quantity)
            .unwrap_or(0)
    }

    pub fn total_units(&self) -> u32 {
        self.items.iter().map(|c| c.quantity).sum()
    }
}

/// Turn a solver outcome into a vendor result.
///
/// Returns `Ok(None)` for any non-optimal status. Quantities are rounded to
/// the nearest integer and the cost is recomputed in cents from menu prices;
/// the solver's own objective value is ignored. A rounded assignment that
/// breaks the model or costs more than the budget is reported as
/// [`PlanError::MalformedAssignment`].
pub fn extract(model: &MenuModel, solution: &Solution) -> Result<Option<VendorResult>, PlanError> {
    if !solution.is_optimal() {
        return Ok(None);
    }

    let malformed = |reason: String| PlanError::MalformedAssignment {
        vendor: model.vendor.clone(),
        reason,
    };

    if solution.values.len() != model.items.len() {
        return Err(malformed(format!(
            "expected {} values, got {}",
            model.items.len(),
            solution.values.len()
        )));
    }

    let mut quantities = Vec::with_capacity(model.items.len());
    for (item, &value) in model.items.iter().zip(&solution.values) {
        let rounded = value.round();
        if !rounded.is_finite() || rounded < 0.0 || rounded > f64::from(u32::MAX) {
            return Err(malformed(format!("{} has quantity {}", item.name, value)));
        }
        quantities.push(rounded as u32);
    }

    let as_values: Vec<f64> = quantities.iter().map(|&q| f64::from(q)).collect();
    if let Some(violation) = model.problem.violations(&as_values, ASSIGNMENT_TOLERANCE).first() {
        return Err(malformed(violation.description.clone()));
    }

    let total_cents = model
        .price_cents
        .iter()
        .zip(&quantities)
        .try_fold(0u64, |acc, (&price, &q)| {
            price.checked_mul(u64::from(q)).and_then(|cost| acc.checked_add(cost))
        })
        .ok_or_else(|| malformed("order cost overflows".to_string()))?;
    if total_cents > model.budget_cents {
        return Err(malformed(format!(
            "order costs {} cents, over the budget of {} cents",
            total_cents, model.budget_cents
        )));
    }

    let items = model
        .items
        .iter()
        .zip(&quantities)
        .filter(|&(_, &q)| q > 0)
        .map(|(item, &quantity)| ChosenItem {
            name: item.name.clone(),
            quantity,
        })
        .collect();

    Ok(Some(VendorResult {
        vendor: model.vendor.clone(),
        total_cents,
        total_cost: money::from_cents(total_cents),
        items,
    }))
}
