use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::inputs::ModelInputs;
use crate::pnl::income_statement::build_income_statement;
use crate::time_value::{irr, mirr, npv, payback_period, IRR_INITIAL_GUESS};
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Rate};
use crate::ClinicModelResult;

use super::cash_flow::{build_cash_flows, CashFlowProjection};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Output of the 5-year DCF valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationOutput {
    pub cash_flows: CashFlowProjection,
    /// Discount rate used (ke); also the MIRR finance and reinvestment rate
    pub discount_rate: Rate,
    pub npv: Money,
    /// None when Newton-Raphson does not converge
    pub irr: Option<Rate>,
    /// None when there is no negative flow to finance
    pub mirr: Option<Rate>,
    /// First year with non-negative cumulative cash flow
    pub payback_year: Option<u32>,
    /// irr - discount_rate
    pub irr_spread: Option<Rate>,
    /// mirr - discount_rate
    pub mirr_spread: Option<Rate>,
    /// npv / EBITDA; None unless EBITDA is positive
    pub implied_ev_ebitda: Option<Multiple>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Value the projected free cash flows. `ebitda_y` only feeds the implied
/// multiple. Undefined figures are reported through `warnings`.
pub fn build_valuation(
    input: &ModelInputs,
    cash_flows: CashFlowProjection,
    ebitda_y: Money,
    warnings: &mut Vec<String>,
) -> ClinicModelResult<ValuationOutput> {
    let flows = cash_flows.flows();
    let ke = input.ke;

    let npv_val = npv(ke, &flows)?;

    let irr_val = match irr(&flows, IRR_INITIAL_GUESS) {
        Ok(r) => Some(r),
        Err(e) => {
            debug!(error = %e, "IRR undefined");
            warnings.push(format!("IRR is undefined for this cash-flow pattern: {e}"));
            None
        }
    };

    let mirr_val = match mirr(&flows, ke, ke) {
        Ok(r) => Some(r),
        Err(e) => {
            warnings.push(format!("MIRR is undefined: {e}"));
            None
        }
    };

    let payback_year = payback_period(&flows).map(|t| t as u32);
    if payback_year.is_none() {
        warnings.push("Cumulative cash flow never turns non-negative within 5 years".into());
    }

    let implied_ev_ebitda = if ebitda_y > Decimal::ZERO {
        npv_val.checked_div(ebitda_y)
    } else {
        None
    };

    Ok(ValuationOutput {
        cash_flows,
        discount_rate: ke,
        npv: npv_val,
        irr: irr_val,
        mirr: mirr_val,
        payback_year,
        irr_spread: irr_val.map(|r| r - ke),
        mirr_spread: mirr_val.map(|r| r - ke),
        implied_ev_ebitda,
    })
}

/// Run the cash-flow projection and valuation from raw inputs.
pub fn calculate_valuation(
    input: &ModelInputs,
) -> ClinicModelResult<ComputationOutput<ValuationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let pnl = build_income_statement(input);
    let cash_flows = build_cash_flows(input, pnl.net_profit.annual);
    let output = build_valuation(input, cash_flows, pnl.ebitda.annual, &mut warnings)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "5-Year FCF DCF (net profit x FCF factor, constant growth)",
        &serde_json::json!({
            "ke": input.ke.to_string(),
            "rev_growth": input.rev_growth.to_string(),
            "fcf_factor": input.fcf_factor.to_string(),
            "initial_investment": input.initial_investment.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_value::cumulative;
    use rust_decimal_macros::dec;

    #[test]
    fn test_baseline_valuation() {
        let result = calculate_valuation(&ModelInputs::default()).unwrap();
        let out = &result.result;

        assert!(out.npv > Decimal::ZERO);
        assert_eq!(out.discount_rate, dec!(0.18));
        assert_eq!(out.payback_year, Some(1));

        let irr_val = out.irr.unwrap();
        assert!(irr_val > dec!(0.18));
        let flows = out.cash_flows.flows();
        assert!(npv(irr_val, &flows).unwrap().abs() < dec!(0.0001));
        assert_eq!(out.irr_spread, Some(irr_val - dec!(0.18)));

        let mirr_val = out.mirr.unwrap();
        // MIRR sits between the reinvestment rate and the IRR
        assert!(mirr_val > dec!(0.18) && mirr_val < irr_val);

        assert!(out.implied_ev_ebitda.unwrap() > Decimal::ZERO);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_payback_matches_cumulative() {
        let input = ModelInputs {
            initial_investment: dec!(5000),
            ..ModelInputs::default()
        };
        let out = calculate_valuation(&input).unwrap().result;
        let t = out.payback_year.unwrap() as usize;
        let cum = cumulative(&out.cash_flows.flows());
        assert!(cum[t] >= Decimal::ZERO);
        assert!(cum[t - 1] < Decimal::ZERO);
    }

    #[test]
    fn test_loss_making_clinic_has_undefined_metrics() {
        let input = ModelInputs {
            patients: 0,
            ..ModelInputs::default()
        };
        let result = calculate_valuation(&input).unwrap();
        let out = &result.result;

        assert!(out.npv < Decimal::ZERO);
        assert!(out.payback_year.is_none());
        assert!(out.implied_ev_ebitda.is_none());
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("never turns non-negative")));
    }

    #[test]
    fn test_no_investment_mirr_undefined() {
        let input = ModelInputs {
            initial_investment: Decimal::ZERO,
            ..ModelInputs::default()
        };
        let result = calculate_valuation(&input).unwrap();
        assert!(result.result.mirr.is_none());
        assert!(result.result.mirr_spread.is_none());
        assert_eq!(result.result.payback_year, Some(0));
        assert!(result.warnings.iter().any(|w| w.starts_with("MIRR")));
    }
}
