use feastplan_solver::{ConstraintOp, LpProblem};

use crate::constraints::ConstraintSpec;
use crate::error::PlanError;
use crate::menu::{MenuItem, Vendor};

/// One vendor's menu translated into an integer program ready for solving.
///
/// Variable `i` of `problem` is the quantity of `items[i]`. Costs in the
/// objective and the budget row are whole cents.
#[derive(Debug, Clone)]
pub struct MenuModel {
    pub vendor: String,
    pub items: Vec<MenuItem>,
    /// Price of `items[i]` in cents
    pub price_cents: Vec<u64>,
    pub budget_cents: u64,
    pub max_repeats: u32,
    pub problem: LpProblem,
}

/// Build the minimum-cost order model for `vendor` under `spec`.
///
/// Constraints, in order: total coverage, vegan coverage, halal coverage,
/// budget, then one repeat cap per item. Coverage uses each item's full
/// serving capacity, so a vegan dish also counts towards total coverage.
/// The model is never pre-checked for feasibility.
pub fn build_model(vendor: &Vendor, spec: &ConstraintSpec) -> Result<MenuModel, PlanError> {
    spec.validate()?;
    vendor.validate()?;
    let budget_cents = spec.budget_cents()?;
    let price_cents = vendor
        .items
        .iter()
        .map(|item| {
            item.price_cents().ok_or_else(|| PlanError::InvalidPrice {
                vendor: vendor.name.clone(),
                item: item.name.clone(),
                price: item.price,
            })
        })
        .collect::<Result<Vec<u64>, PlanError>>()?;

    let names: Vec<String> = vendor.items.iter().map(|i| i.name.clone()).collect();
    let n = names.len();
    let mut lp = LpProblem::new(names);
    lp.set_all_integer();

    // Cent amounts are below 2^53, so these coefficients are exact
    let prices: Vec<f64> = price_cents.iter().map(|&c| c as f64).collect();
    let serves: Vec<f64> = vendor.items.iter().map(|i| f64::from(i.serves)).collect();
    let vegan_serves: Vec<f64> = vendor
        .items
        .iter()
        .map(|i| if i.vegan { f64::from(i.serves) } else { 0.0 })
        .collect();
    let halal_serves: Vec<f64> = vendor
        .items
        .iter()
        .map(|i| if i.halal { f64::from(i.serves) } else { 0.0 })
        .collect();

    // Objective: minimize cost
    lp.set_objective(prices.clone(), true);

    lp.add_constraint("people", serves, ConstraintOp::Ge, f64::from(spec.people));
    lp.add_constraint("vegan", vegan_serves, ConstraintOp::Ge, f64::from(spec.vegan_min));
    lp.add_constraint("halal", halal_serves, ConstraintOp::Ge, f64::from(spec.halal_min));
    lp.add_constraint("budget", prices, ConstraintOp::Le, budget_cents as f64);

    for (i, item) in vendor.items.iter().enumerate() {
        let mut coeffs = vec![0.0; n];
        coeffs[i] = 1.0;
        lp.add_constraint(
            format!("{}_max_repeats", item.name),
            coeffs,
            ConstraintOp::Le,
            f64::from(spec.max_repeats),
        );
    }

    log::debug!(
        "built model for {}: {} variables, {} constraints",
        vendor.name,
        lp.num_variables(),
        lp.num_constraints()
    );

    Ok(MenuModel {
        vendor: vendor.name.clone(),
        items: vendor.items.clone(),
        price_cents,
        budget_cents,
        max_repeats: spec.max_repeats,
        problem: lp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vendor() -> Vendor {
        Vendor::new(
            "Thai House",
            vec![
                MenuItem::new("Veggie Stir Fry", 2, 18.0).vegan(),
                MenuItem::new("Green Curry", 3, 28.0).vegan(),
                MenuItem::new("Chicken Satay", 2, 22.0).halal(),
            ],
        )
    }

    fn constraint<'a>(model: &'a MenuModel, name: &str) -> &'a feastplan_solver::Constraint {
        model
            .problem
            .constraints
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("missing constraint {name}"))
    }

    #[test]
    fn test_build_model_structure() {
        let model = build_model(&sample_vendor(), &ConstraintSpec::default()).unwrap();

        assert_eq!(model.vendor, "Thai House");
        assert_eq!(model.problem.num_variables(), 3);
        // people, vegan, halal, budget + one cap per item
        assert_eq!(model.problem.num_constraints(), 7);
        assert!(model.problem.objective.minimize);
        assert_eq!(model.problem.objective.coefficients, vec![1800.0, 2800.0, 2200.0]);
        assert_eq!(model.price_cents, vec![1800, 2800, 2200]);
        assert_eq!(model.budget_cents, 12000);
        assert!((0..3).all(|i| model.problem.is_integer(i)));
    }

    #[test]
    fn test_coverage_rows_use_raw_capacity() {
        let model = build_model(&sample_vendor(), &ConstraintSpec::default()).unwrap();

        let people = constraint(&model, "people");
        assert_eq!(people.coefficients, vec![2.0, 3.0, 2.0]);
        assert_eq!(people.op, ConstraintOp::Ge);
        assert_eq!(people.rhs, 10.0);

        let vegan = constraint(&model, "vegan");
        assert_eq!(vegan.coefficients, vec![2.0, 3.0, 0.0]);
        assert_eq!(vegan.rhs, 2.0);

        let halal = constraint(&model, "halal");
        assert_eq!(halal.coefficients, vec![0.0, 0.0, 2.0]);
        assert_eq!(halal.rhs, 1.0);

        let budget = constraint(&model, "budget");
        assert_eq!(budget.coefficients, vec![1800.0, 2800.0, 2200.0]);
        assert_eq!(budget.op, ConstraintOp::Le);
        assert_eq!(budget.rhs, 12000.0);
    }

    #[test]
    fn test_repeat_cap_per_item() {
        let spec = ConstraintSpec {
            max_repeats: 3,
            ..ConstraintSpec::default()
        };
        let model = build_model(&sample_vendor(), &spec).unwrap();

        let cap = constraint(&model, "Green Curry_max_repeats");
        assert_eq!(cap.coefficients, vec![0.0, 1.0, 0.0]);
        assert_eq!(cap.op, ConstraintOp::Le);
        assert_eq!(cap.rhs, 3.0);
        assert_eq!(model.max_repeats, 3);
    }

    #[test]
    fn test_decimal_prices_become_whole_cents() {
        let vendor = Vendor::new(
            "Kiosk",
            vec![MenuItem::new("Tea", 1, 0.1), MenuItem::new("Biscuit", 1, 0.2)],
        );
        let spec = ConstraintSpec {
            people: 2,
            vegan_min: 0,
            halal_min: 0,
            budget: 0.3,
            max_repeats: 1,
        };

        let model = build_model(&vendor, &spec).unwrap();

        assert_eq!(model.problem.objective.coefficients, vec![10.0, 20.0]);
        let budget = constraint(&model, "budget");
        assert_eq!(budget.coefficients, vec![10.0, 20.0]);
        assert_eq!(budget.rhs, 30.0);
    }

    #[test]
    fn test_zero_repeats_still_builds() {
        let spec = ConstraintSpec {
            max_repeats: 0,
            ..ConstraintSpec::default()
        };
        let model = build_model(&sample_vendor(), &spec).unwrap();
        assert_eq!(constraint(&model, "Veggie Stir Fry_max_repeats").rhs, 0.0);
    }

    #[test]
    fn test_unaffordable_request_still_builds() {
        let spec = ConstraintSpec {
            budget: 1.0,
            ..ConstraintSpec::default()
        };
        assert!(build_model(&sample_vendor(), &spec).is_ok());
    }

    #[test]
    fn test_rejects_malformed_input_before_solving() {
        let bad_vendor = Vendor::new("Diner", vec![MenuItem::new("Air", 0, 1.0)]);
        assert!(matches!(
            build_model(&bad_vendor, &ConstraintSpec::default()),
            Err(PlanError::ZeroCapacity { .. })
        ));

        let bad_spec = ConstraintSpec {
            budget: -5.0,
            ..ConstraintSpec::default()
        };
        assert_eq!(
            build_model(&sample_vendor(), &bad_spec).unwrap_err(),
            PlanError::InvalidBudget(-5.0)
        );
    }
}
