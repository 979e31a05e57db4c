use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inputs::ModelInputs;
use crate::types::{safe_divide, Money, Rate};

use super::income_statement::IncomeStatement;

/// Headline ratios shown next to the income statement.
///
/// Every ratio is a display figure: a zero denominator yields 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub ebitda_margin: Rate,
    pub net_margin: Rate,
    pub gross_margin: Rate,
    /// Fixed costs (clinical + admin + other) over revenue
    pub fixed_ratio: Rate,
    /// Drugs + labs over revenue
    pub var_ratio: Rate,
    pub ebitda_per_patient: Money,
    pub revenue_per_patient: Money,
    pub total_costs: Money,
    /// Revenue generated per unit of total cost
    pub revenue_per_cost_unit: Decimal,
    pub clinical_cost_per_patient: Money,
    pub total_cost_per_patient: Money,
    /// Admin payroll share of total labour cost
    pub admin_labor_share: Rate,
    /// Annual EBITDA over the initial investment; None without an investment
    pub roic_proxy: Option<Rate>,
}

pub fn compute_key_metrics(input: &ModelInputs, pnl: &IncomeStatement) -> KeyMetrics {
    let zero = Decimal::ZERO;
    let rev_y = pnl.revenue.annual;
    let patients = input.patients_dec();
    let total_costs = pnl.total_costs_y();
    let labor = pnl.clinical_staff.annual + pnl.admin_staff.annual;

    KeyMetrics {
        ebitda_margin: safe_divide(pnl.ebitda.annual, rev_y, zero),
        net_margin: safe_divide(pnl.net_profit.annual, rev_y, zero),
        gross_margin: safe_divide(pnl.gross_profit.annual, rev_y, zero),
        fixed_ratio: safe_divide(pnl.fixed_costs_y(), rev_y, zero),
        var_ratio: safe_divide(pnl.variable_costs_y(), rev_y, zero),
        ebitda_per_patient: safe_divide(pnl.ebitda.annual, patients, zero),
        revenue_per_patient: safe_divide(rev_y, patients, zero),
        total_costs,
        revenue_per_cost_unit: safe_divide(rev_y, total_costs, zero),
        clinical_cost_per_patient: safe_divide(pnl.clinical_staff.annual, patients, zero),
        total_cost_per_patient: safe_divide(total_costs, patients, zero),
        admin_labor_share: safe_divide(pnl.admin_staff.annual, labor, zero),
        roic_proxy: if input.initial_investment.is_zero() {
            None
        } else {
            pnl.ebitda.annual.checked_div(input.initial_investment)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pnl::income_statement::build_income_statement;
    use rust_decimal_macros::dec;

    #[test]
    fn test_baseline_ratios() {
        let input = ModelInputs::default();
        let pnl = build_income_statement(&input);
        let kpi = compute_key_metrics(&input, &pnl);

        assert!((kpi.ebitda_margin - dec!(6308.75) / dec!(13500)).abs() < dec!(0.0000001));
        assert_eq!(kpi.revenue_per_patient, dec!(54));
        assert!((kpi.ebitda_per_patient - dec!(25.235)).abs() < dec!(0.0000001));
        assert!((kpi.total_costs - dec!(7191.25)).abs() < dec!(0.0000001));
        // 498.75 / (1038.75 + 498.75)
        assert!((kpi.admin_labor_share - dec!(0.3243902439)).abs() < dec!(0.0000001));
        // 6308.75 / 650
        let roic = kpi.roic_proxy.unwrap();
        assert!((roic - dec!(9.7057692308)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_roic_proxy_needs_an_investment() {
        let input = ModelInputs {
            initial_investment: Decimal::ZERO,
            ..ModelInputs::default()
        };
        let pnl = build_income_statement(&input);
        assert_eq!(compute_key_metrics(&input, &pnl).roic_proxy, None);

        let loss_making = ModelInputs {
            patients: 40,
            ..ModelInputs::default()
        };
        let pnl = build_income_statement(&loss_making);
        let roic = compute_key_metrics(&loss_making, &pnl).roic_proxy.unwrap();
        assert!(roic < Decimal::ZERO);
    }

    #[test]
    fn test_zero_patients_guarded() {
        let input = ModelInputs {
            patients: 0,
            ..ModelInputs::default()
        };
        let pnl = build_income_statement(&input);
        let kpi = compute_key_metrics(&input, &pnl);

        assert_eq!(kpi.ebitda_margin, Decimal::ZERO);
        assert_eq!(kpi.fixed_ratio, Decimal::ZERO);
        assert_eq!(kpi.ebitda_per_patient, Decimal::ZERO);
        assert_eq!(kpi.revenue_per_cost_unit, Decimal::ZERO);
        assert!(kpi.total_costs > Decimal::ZERO);
    }
}
