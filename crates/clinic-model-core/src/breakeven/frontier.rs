use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

const FRONTIER_POINTS: usize = 160;
const FRONTIER_MIN_PATIENTS: Decimal = dec!(30);
const FRONTIER_MIN_SPAN: Decimal = dec!(400);

/// A (volume, tariff) pair on the break-even curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub patients: Decimal,
    pub tariff: Money,
}

/// Tariff that exactly breaks even at `patients`:
/// (fixed + var * p) / p, asymptotic to `var_pp_y` as volume grows.
pub fn breakeven_tariff(fixed_y: Money, var_pp_y: Money, patients: Decimal) -> Option<Money> {
    if patients <= Decimal::ZERO {
        return None;
    }
    Some((fixed_y + var_pp_y * patients) / patients)
}

/// The full frontier drawn on the dashboard: 160 points from 30 patients up to
/// the larger of 1.6x the plan and 400.
pub fn breakeven_frontier(fixed_y: Money, var_pp_y: Money, plan_patients: u32) -> Vec<FrontierPoint> {
    let scaled = (Decimal::from(plan_patients) * dec!(1.6)).floor();
    let max_patients = scaled.max(FRONTIER_MIN_SPAN);
    frontier_between(fixed_y, var_pp_y, FRONTIER_MIN_PATIENTS, max_patients, FRONTIER_POINTS)
}

/// Sample the frontier at `n` evenly spaced volumes in [lo, hi]. Non-positive
/// volumes are skipped since no tariff breaks even with no patients.
pub fn frontier_between(
    fixed_y: Money,
    var_pp_y: Money,
    lo: Decimal,
    hi: Decimal,
    n: usize,
) -> Vec<FrontierPoint> {
    linspace(lo, hi, n)
        .into_iter()
        .filter_map(|p| {
            breakeven_tariff(fixed_y, var_pp_y, p).map(|tariff| FrontierPoint { patients: p, tariff })
        })
        .collect()
}

/// `n` evenly spaced values from `lo` to `hi` inclusive.
pub(crate) fn linspace(lo: Decimal, hi: Decimal, n: usize) -> Vec<Decimal> {
    match n {
        0 => Vec::new(),
        1 => vec![lo],
        _ => {
            let step = (hi - lo) / Decimal::from((n - 1) as u64);
            (0..n)
                .map(|i| {
                    if i == n - 1 {
                        hi
                    } else {
                        lo + step * Decimal::from(i as u64)
                    }
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_breakeven_tariff_formula() {
        // (1000 + 20*100) / 100 = 30
        assert_eq!(breakeven_tariff(dec!(1000), dec!(20), dec!(100)), Some(dec!(30)));
        assert_eq!(breakeven_tariff(dec!(1000), dec!(20), Decimal::ZERO), None);
    }

    #[test]
    fn test_frontier_shape() {
        let curve = breakeven_frontier(dec!(1755.25), dec!(21.744), 250);
        assert_eq!(curve.len(), 160);
        assert_eq!(curve[0].patients, dec!(30));
        // max(floor(250*1.6), 400) = 400
        assert_eq!(curve[159].patients, dec!(400));

        // Strictly decreasing towards the variable-cost asymptote
        for pair in curve.windows(2) {
            assert!(pair[1].tariff < pair[0].tariff);
            assert!(pair[1].tariff > dec!(21.744));
        }
    }

    #[test]
    fn test_frontier_extends_with_large_plan() {
        let curve = breakeven_frontier(dec!(1000), dec!(10), 500);
        assert_eq!(curve.last().unwrap().patients, dec!(800));
    }

    #[test]
    fn test_frontier_skips_zero_volume() {
        let curve = frontier_between(dec!(100), dec!(1), Decimal::ZERO, dec!(10), 11);
        assert_eq!(curve.len(), 10);
        assert_eq!(curve[0].patients, dec!(1));
    }

    #[test]
    fn test_linspace() {
        assert_eq!(
            linspace(dec!(0), dec!(1), 5),
            vec![dec!(0), dec!(0.25), dec!(0.5), dec!(0.75), dec!(1)]
        );
        assert!(linspace(dec!(0), dec!(1), 0).is_empty());
        assert_eq!(linspace(dec!(3), dec!(9), 1), vec![dec!(3)]);
    }
}
