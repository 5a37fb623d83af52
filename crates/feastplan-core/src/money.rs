//! Amounts in whole cents.
//!
//! Prices and budgets arrive as decimal amounts. Every sum and comparison
//! is done on integer minor units, so two orders with the same real cost
//! compare equal and a cost at the budget is never pushed over it.

/// Minor units per currency unit
pub const CENTS_PER_UNIT: f64 = 100.0;

/// Largest cent amount that survives a round trip through `f64`
pub const MAX_EXACT_CENTS: u64 = 1 << 53;

/// Scaled amounts this close to a whole cent are that cent
const CENT_SNAP: f64 = 1e-6;

/// Nearest whole number of cents for a price.
///
/// `None` for negative or non-finite amounts and for amounts too large to
/// convert exactly.
pub fn to_cents(amount: f64) -> Option<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let cents = (amount * CENTS_PER_UNIT).round();
    (cents <= MAX_EXACT_CENTS as f64).then_some(cents as u64)
}

/// Whole cents that may be spent without going over `amount`.
///
/// A fraction of a cent is dropped unless it is float noise around a whole
/// cent. Amounts beyond [`MAX_EXACT_CENTS`] saturate.
pub fn to_cents_floor(amount: f64) -> Option<u64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let scaled = amount * CENTS_PER_UNIT;
    let nearest = scaled.round();
    let cents = if (scaled - nearest).abs() <= CENT_SNAP {
        nearest
    } else {
        scaled.floor()
    };
    Some(cents.min(MAX_EXACT_CENTS as f64) as u64)
}

/// Cents back to currency units, for display and serialization.
pub fn from_cents(cents: u64) -> f64 {
    cents as f64 / CENTS_PER_UNIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.1, 10)]
    #[case(0.2, 20)]
    #[case(0.29, 29)]
    #[case(18.0, 1800)]
    #[case(12.3456, 1235)]
    #[case(0.0, 0)]
    fn test_price_to_cents(#[case] amount: f64, #[case] cents: u64) {
        assert_eq!(to_cents(amount), Some(cents));
    }

    #[test]
    fn test_price_rejects_bad_amounts() {
        assert_eq!(to_cents(-0.01), None);
        assert_eq!(to_cents(f64::NAN), None);
        assert_eq!(to_cents(f64::INFINITY), None);
        assert_eq!(to_cents(1e300), None);
    }

    #[rstest]
    #[case(0.3, 30)]
    #[case(0.29, 29)]
    #[case(120.0, 12000)]
    #[case(10.005, 1000)]
    #[case(10.999, 1099)]
    fn test_budget_never_rounds_up(#[case] amount: f64, #[case] cents: u64) {
        assert_eq!(to_cents_floor(amount), Some(cents));
    }

    #[test]
    fn test_huge_budget_saturates() {
        assert_eq!(to_cents_floor(1e300), Some(MAX_EXACT_CENTS));
        assert_eq!(to_cents_floor(-1.0), None);
    }

    #[test]
    fn test_sum_of_cents_matches_decimal_literal() {
        assert_ne!(0.1 + 0.2, 0.3);
        assert_eq!(from_cents(10 + 20), 0.3);
    }
}
