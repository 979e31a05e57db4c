use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::ClinicModelError;
use crate::types::{Money, Rate};
use crate::ClinicModelResult;

/// Default Newton-Raphson starting point for IRR.
pub const IRR_INITIAL_GUESS: Rate = dec!(0.20);

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const DERIVATIVE_FLOOR: Decimal = dec!(0.000000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Net Present Value of a series of cash flows, first flow at t = 0
pub fn npv(rate: Rate, cash_flows: &[Money]) -> ClinicModelResult<Money> {
    check_rate("rate", rate)?;

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        if discount.is_zero() {
            return Err(ClinicModelError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal Rate of Return using Newton-Raphson.
///
/// Stops when successive estimates differ by less than 1e-7 and returns the
/// newer one. A derivative below 1e-9 in magnitude (flat cash-flow pattern)
/// or 100 iterations without converging is a `ConvergenceFailure`.
pub fn irr(cash_flows: &[Money], guess: Rate) -> ClinicModelResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(ClinicModelError::InsufficientData(
            "IRR requires at least 2 cash flows".into(),
        ));
    }

    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = npv_and_derivative(rate, cash_flows);

        if dnpv.abs() < DERIVATIVE_FLOOR {
            return Err(ClinicModelError::ConvergenceFailure {
                function: "IRR".into(),
                iterations: i,
                last_delta: npv_val,
            });
        }

        let next = rate - npv_val / dnpv;
        if (next - rate).abs() < CONVERGENCE_THRESHOLD {
            return Ok(next);
        }

        // Guard against divergence
        rate = if next < dec!(-0.99) {
            dec!(-0.99)
        } else if next > dec!(100.0) {
            dec!(100.0)
        } else {
            next
        };
    }

    let (last_delta, _) = npv_and_derivative(rate, cash_flows);
    Err(ClinicModelError::ConvergenceFailure {
        function: "IRR".into(),
        iterations: MAX_IRR_ITERATIONS,
        last_delta,
    })
}

/// Modified IRR: negative flows discounted to t = 0 at `finance_rate`,
/// positive flows compounded to t = N at `reinvest_rate`.
pub fn mirr(
    cash_flows: &[Money],
    finance_rate: Rate,
    reinvest_rate: Rate,
) -> ClinicModelResult<Rate> {
    check_rate("finance_rate", finance_rate)?;
    check_rate("reinvest_rate", reinvest_rate)?;

    let n = cash_flows.len().saturating_sub(1);
    if n == 0 {
        return Err(ClinicModelError::InsufficientData(
            "MIRR requires at least one period after t = 0".into(),
        ));
    }

    let one_plus_f = Decimal::ONE + finance_rate;
    let one_plus_r = Decimal::ONE + reinvest_rate;

    let mut pv_neg = Decimal::ZERO;
    let mut fv_pos = Decimal::ZERO;
    for (t, cf) in cash_flows.iter().enumerate() {
        if *cf < Decimal::ZERO {
            pv_neg += cf / one_plus_f.powi(t as i64);
        } else if *cf > Decimal::ZERO {
            fv_pos += cf * one_plus_r.powi((n - t) as i64);
        }
    }

    if pv_neg.is_zero() {
        return Err(ClinicModelError::InsufficientData(
            "MIRR requires at least one negative cash flow".into(),
        ));
    }
    if fv_pos.is_zero() {
        // Nothing is ever recovered: (0)^(1/N) - 1
        return Ok(dec!(-1));
    }

    let ratio = fv_pos
        .checked_div(pv_neg)
        .ok_or_else(|| ClinicModelError::DivisionByZero {
            context: "MIRR: outlays too small against the reinvested inflows".into(),
        })?
        .abs();
    let exponent = Decimal::ONE / Decimal::from(n as u64);
    Ok(ratio.powd(exponent) - Decimal::ONE)
}

/// Running total of a cash-flow series.
pub fn cumulative(cash_flows: &[Money]) -> Vec<Money> {
    cash_flows
        .iter()
        .scan(Decimal::ZERO, |acc, cf| {
            *acc += *cf;
            Some(*acc)
        })
        .collect()
}

/// First period whose cumulative cash flow is non-negative.
pub fn payback_period(cash_flows: &[Money]) -> Option<usize> {
    cumulative(cash_flows)
        .iter()
        .position(|c| *c >= Decimal::ZERO)
}

fn check_rate(field: &str, rate: Rate) -> ClinicModelResult<()> {
    if rate <= dec!(-1) {
        return Err(ClinicModelError::InvalidInput {
            field: field.into(),
            reason: "Rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

/// f(r) = Σ cf/(1+r)^t and f'(r) = Σ -t·cf/(1+r)^(t+1)
fn npv_and_derivative(rate: Rate, cash_flows: &[Money]) -> (Decimal, Decimal) {
    let one_plus_r = Decimal::ONE + rate;
    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount *= one_plus_r;
        }
        npv_val += cf / discount;
        if t > 0 {
            dnpv -= Decimal::from(t as u64) * cf / (discount * one_plus_r);
        }
    }

    (npv_val, dnpv)
}
