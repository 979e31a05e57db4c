use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::inputs::ModelInputs;
use crate::types::{safe_divide, with_metadata, ComputationOutput, Money, Rate};
use crate::ClinicModelResult;

const MONTHS: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One line of the income statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PnlLine {
    pub monthly: Money,
    pub annual: Money,
    /// Annual amount over annual revenue; 0 when there is no revenue
    pub pct_of_revenue: Rate,
}

/// Monthly and annual income statement of the clinic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: PnlLine,
    pub clinical_staff: PnlLine,
    pub drugs: PnlLine,
    pub labs: PnlLine,
    pub gross_profit: PnlLine,
    pub admin_staff: PnlLine,
    pub other_opex: PnlLine,
    pub ebitda: PnlLine,
    pub income_tax: PnlLine,
    pub net_profit: PnlLine,
}

impl IncomeStatement {
    /// Costs that do not move with patient volume: clinical + admin + other.
    pub fn fixed_costs_y(&self) -> Money {
        self.clinical_staff.annual + self.admin_staff.annual + self.other_opex.annual
    }

    /// Drugs + labs.
    pub fn variable_costs_y(&self) -> Money {
        self.drugs.annual + self.labs.annual
    }

    pub fn total_costs_y(&self) -> Money {
        self.fixed_costs_y() + self.variable_costs_y()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Build the income statement. Monthly figures are computed first and
/// annualised by 12; tax is assessed on annual EBITDA and never negative.
pub fn build_income_statement(input: &ModelInputs) -> IncomeStatement {
    let patients = input.patients_dec();

    let rev_m = patients * input.tariff / MONTHS;
    let clinical_m = input.clinical_pay * (Decimal::ONE + input.clinical_bur) / MONTHS;
    let drugs_m = input.drugs_base * patients * (Decimal::ONE + input.drugs_cont);
    let labs_m = input.labs_base * patients * (Decimal::ONE + input.labs_cont);
    let gross_m = rev_m - (clinical_m + drugs_m + labs_m);
    let admin_m = input.admin_pay * (Decimal::ONE + input.admin_bur) / MONTHS;
    let other_m = (input.rent / MONTHS) * (Decimal::ONE + input.util_pct)
        + (input.ehr_m + input.it_m)
        + (input.office_y + input.licenses_y + input.mal_md_y + input.mal_np_y) / MONTHS;
    let ebitda_m = gross_m - admin_m - other_m;

    let rev_y = rev_m * MONTHS;
    let ebitda_y = ebitda_m * MONTHS;
    let taxes_y = (ebitda_y * input.tax_rate).max(Decimal::ZERO);
    let net_y = ebitda_y - taxes_y;

    let line_m = |monthly: Money| line(monthly, monthly * MONTHS, rev_y);
    let line_y = |annual: Money| line(annual / MONTHS, annual, rev_y);

    IncomeStatement {
        revenue: line_m(rev_m),
        clinical_staff: line_m(clinical_m),
        drugs: line_m(drugs_m),
        labs: line_m(labs_m),
        gross_profit: line_m(gross_m),
        admin_staff: line_m(admin_m),
        other_opex: line_m(other_m),
        ebitda: line_m(ebitda_m),
        income_tax: line_y(taxes_y),
        net_profit: line_y(net_y),
    }
}

/// Income statement wrapped in the standard output envelope.
pub fn analyze_income_statement(
    input: &ModelInputs,
) -> ClinicModelResult<ComputationOutput<IncomeStatement>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let statement = build_income_statement(input);

    if input.patients == 0 {
        warnings.push("Patient volume is zero; only fixed costs accrue".into());
    }
    if statement.ebitda.annual < Decimal::ZERO {
        warnings.push(format!(
            "EBITDA is negative ({}); no income tax is assessed",
            statement.ebitda.annual.round_dp(2)
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Clinic P&L (monthly build-up, annualised x12)",
        input,
        warnings,
        elapsed,
        statement,
    ))
}

fn line(monthly: Money, annual: Money, rev_y: Money) -> PnlLine {
    PnlLine {
        monthly,
        annual,
        pct_of_revenue: safe_divide(annual, rev_y, Decimal::ZERO),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.000000001);

    fn close(a: Decimal, b: Decimal) -> bool {
        (a - b).abs() < TOL
    }

    #[test]
    fn test_baseline_golden_values() {
        let pnl = build_income_statement(&ModelInputs::default());

        assert_eq!(pnl.revenue.annual, dec!(13500));
        assert!(close(pnl.drugs.annual, dec!(4824)));
        assert!(close(pnl.labs.annual, dec!(612)));
        assert!(close(pnl.clinical_staff.annual, dec!(1038.75)));
        assert!(close(pnl.admin_staff.annual, dec!(498.75)));
        assert!(close(pnl.other_opex.annual, dec!(217.75)));
        assert!(close(pnl.gross_profit.annual, dec!(7025.25)));
        assert!(close(pnl.ebitda.annual, dec!(6308.75)));
        assert!(close(pnl.income_tax.annual, dec!(1324.8375)));
        assert!(close(pnl.net_profit.annual, dec!(4983.9125)));
    }

    #[test]
    fn test_monthly_annual_consistency() {
        let pnl = build_income_statement(&ModelInputs::default());
        assert_eq!(pnl.revenue.annual, pnl.revenue.monthly * dec!(12));
        assert_eq!(pnl.ebitda.annual, pnl.ebitda.monthly * dec!(12));
        assert!(close(
            pnl.gross_profit.annual - pnl.admin_staff.annual - pnl.other_opex.annual,
            pnl.ebitda.annual
        ));
    }

    #[test]
    fn test_tax_and_net_profit() {
        let pnl = build_income_statement(&ModelInputs::default());
        assert_eq!(pnl.income_tax.annual, pnl.ebitda.annual * dec!(0.21));
        assert_eq!(pnl.net_profit.annual, pnl.ebitda.annual - pnl.income_tax.annual);
    }

    #[test]
    fn test_zero_patients_only_fixed_costs() {
        let input = ModelInputs {
            patients: 0,
            ..ModelInputs::default()
        };
        let pnl = build_income_statement(&input);

        assert_eq!(pnl.revenue.annual, Decimal::ZERO);
        assert_eq!(pnl.drugs.annual, Decimal::ZERO);
        assert_eq!(pnl.labs.annual, Decimal::ZERO);
        assert!(pnl.ebitda.annual < Decimal::ZERO);
        assert!(close(pnl.ebitda.annual, -pnl.fixed_costs_y()));
        // No tax credit on a loss
        assert_eq!(pnl.income_tax.annual, Decimal::ZERO);
        assert_eq!(pnl.net_profit.annual, pnl.ebitda.annual);
        // Percent-of-revenue guarded, not a division error
        assert_eq!(pnl.ebitda.pct_of_revenue, Decimal::ZERO);
    }

    #[test]
    fn test_pct_of_revenue() {
        let pnl = build_income_statement(&ModelInputs::default());
        assert_eq!(pnl.revenue.pct_of_revenue, Decimal::ONE);
        assert!(close(pnl.drugs.pct_of_revenue, dec!(4824) / dec!(13500)));
    }

    #[test]
    fn test_cost_aggregates() {
        let pnl = build_income_statement(&ModelInputs::default());
        assert!(close(pnl.fixed_costs_y(), dec!(1755.25)));
        assert!(close(pnl.variable_costs_y(), dec!(5436)));
        assert!(close(pnl.total_costs_y(), dec!(7191.25)));
    }

    #[test]
    fn test_envelope_warns_on_loss() {
        let input = ModelInputs {
            patients: 0,
            ..ModelInputs::default()
        };
        let out = analyze_income_statement(&input).unwrap();
        assert_eq!(out.warnings.len(), 2);
        assert_eq!(
            out.methodology,
            "Clinic P&L (monthly build-up, annualised x12)"
        );
    }
}
