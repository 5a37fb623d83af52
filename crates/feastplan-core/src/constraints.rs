use crate::error::PlanError;
use crate::money;

/// Requirements for one catering order.
///
/// Vegan and halal minimums are sub-covering requirements: servings that
/// count towards them also count towards `people`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    /// Total number of people to feed
    pub people: u32,
    /// People who must be servable from vegan items
    pub vegan_min: u32,
    /// People who must be servable from halal items
    pub halal_min: u32,
    /// Maximum total spend
    pub budget: f64,
    /// Maximum units of any single item; 0 forbids ordering anything
    pub max_repeats: u32,
}

impl Default for ConstraintSpec {
    fn default() -> Self {
        Self {
            people: 10,
            vegan_min: 2,
            halal_min: 1,
            budget: 120.0,
            max_repeats: 1,
        }
    }
}

impl ConstraintSpec {
    /// Reject requests that no vendor could meaningfully be asked about.
    ///
    /// Dietary minimums above `people` are allowed; they simply force extra
    /// coverage.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.people == 0 {
            return Err(PlanError::NoPeople);
        }
        self.budget_cents()?;
        Ok(())
    }

    /// Budget in whole cents, never rounded up.
    pub fn budget_cents(&self) -> Result<u64, PlanError> {
        money::to_cents_floor(self.budget).ok_or(PlanError::InvalidBudget(self.budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(ConstraintSpec::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_zero_people() {
        let spec = ConstraintSpec {
            people: 0,
            ..ConstraintSpec::default()
        };
        assert_eq!(spec.validate(), Err(PlanError::NoPeople));
    }

    #[test]
    fn test_rejects_bad_budgets() {
        for budget in [-1.0, f64::NAN, f64::INFINITY] {
            let spec = ConstraintSpec {
                budget,
                ..ConstraintSpec::default()
            };
            assert!(matches!(spec.validate(), Err(PlanError::InvalidBudget(_))), "budget {budget}");
        }
    }

    #[test]
    fn test_budget_cents_does_not_round_up() {
        let spec = ConstraintSpec {
            budget: 0.3,
            ..ConstraintSpec::default()
        };
        assert_eq!(spec.budget_cents(), Ok(30));

        let spec = ConstraintSpec {
            budget: 9.999,
            ..ConstraintSpec::default()
        };
        assert_eq!(spec.budget_cents(), Ok(999));
    }

    #[test]
    fn test_dietary_minimum_above_people_is_allowed() {
        let spec = ConstraintSpec {
            people: 4,
            vegan_min: 6,
            ..ConstraintSpec::default()
        };
        assert_eq!(spec.validate(), Ok(()));
    }
}
