use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::breakeven::BreakevenOutput;
use crate::pnl::KeyMetrics;
use crate::stress::StressSummary;
use crate::types::Money;
use crate::valuation::ValuationOutput;

use super::bands::*;

/// NPV above which a clinic can be a strong buy, in model currency thousands.
const STRONG_BUY_MIN_NPV: Money = dec!(500);
/// NPV floor for a conditional recommendation.
const CONDITIONAL_MIN_NPV: Money = dec!(-200);
/// IRR premium over ke required for a strong buy.
const STRONG_BUY_IRR_PREMIUM: Decimal = dec!(0.05);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategicPosition {
    MarketLeader,
    StrongPerformer,
    MarketParticipant,
    Challenged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Conditional,
    Avoid,
}

/// Qualitative reading of a full model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    pub ebitda_margin: EbitdaMarginBand,
    pub net_margin: NetMarginBand,
    pub margin_of_safety: SafetyBand,
    pub unit_economics: UnitEconomicsBand,
    pub cost_structure: CostStructureBand,
    pub cost_efficiency: CostEfficiencyBand,
    pub admin_burden: AdminBurdenBand,
    pub npv: NpvVerdict,
    pub irr: IrrVerdict,
    pub payback: PaybackQuality,
    pub implied_multiple: Option<MultipleBand>,
    pub stress_resilience: ResilienceBand,
    pub strategic_position: StrategicPosition,
    pub recommendation: Recommendation,
}

pub fn interpret(
    kpi: &KeyMetrics,
    breakeven: &BreakevenOutput,
    valuation: &ValuationOutput,
    stress: &StressSummary,
) -> Interpretation {
    Interpretation {
        ebitda_margin: ebitda_margin_band(kpi.ebitda_margin),
        net_margin: net_margin_band(kpi.net_margin),
        margin_of_safety: safety_band(breakeven.margin_of_safety_pct),
        unit_economics: unit_economics_band(breakeven.contribution_margin_pct),
        cost_structure: cost_structure_band(kpi.fixed_ratio),
        cost_efficiency: cost_efficiency_band(kpi.revenue_per_cost_unit),
        admin_burden: admin_burden_band(kpi.admin_labor_share),
        npv: npv_verdict(valuation.npv),
        irr: irr_verdict(valuation.irr, valuation.discount_rate),
        payback: payback_quality(valuation.payback_year),
        implied_multiple: multiple_band(valuation.implied_ev_ebitda),
        stress_resilience: resilience_band(stress.resilience_score, stress.worst_ebitda),
        strategic_position: strategic_position(kpi, breakeven),
        recommendation: recommendation(kpi, breakeven, valuation),
    }
}

/// All three of margin, safety and cost efficiency must clear a tier.
pub fn strategic_position(kpi: &KeyMetrics, breakeven: &BreakevenOutput) -> StrategicPosition {
    // An undefined margin of safety fails every tier
    let mos = breakeven.margin_of_safety_pct.unwrap_or(dec!(-1));
    let (margin, rpc) = (kpi.ebitda_margin, kpi.revenue_per_cost_unit);

    if margin >= dec!(0.35) && mos >= dec!(0.5) && rpc >= dec!(1.5) {
        StrategicPosition::MarketLeader
    } else if margin >= dec!(0.25) && mos >= dec!(0.3) && rpc >= dec!(1.3) {
        StrategicPosition::StrongPerformer
    } else if margin >= dec!(0.15) && mos >= dec!(0.2) && rpc >= dec!(1.2) {
        StrategicPosition::MarketParticipant
    } else {
        StrategicPosition::Challenged
    }
}

pub fn recommendation(
    kpi: &KeyMetrics,
    breakeven: &BreakevenOutput,
    valuation: &ValuationOutput,
) -> Recommendation {
    let npv = valuation.npv;
    let margin = kpi.ebitda_margin;
    let mos = breakeven.margin_of_safety_pct;
    let irr_clears = valuation
        .irr
        .map(|r| r > valuation.discount_rate + STRONG_BUY_IRR_PREMIUM)
        .unwrap_or(false);

    if npv > STRONG_BUY_MIN_NPV
        && margin >= dec!(0.25)
        && mos.is_some_and(|m| m >= dec!(0.40))
        && irr_clears
    {
        Recommendation::StrongBuy
    } else if npv > Decimal::ZERO && margin >= dec!(0.18) && mos.is_some_and(|m| m >= dec!(0.25)) {
        Recommendation::Buy
    } else if npv > CONDITIONAL_MIN_NPV && margin >= dec!(0.12) {
        Recommendation::Conditional
    } else {
        Recommendation::Avoid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::ModelInputs;
    use crate::model::compute;
    use rust_decimal_macros::dec;

    #[test]
    fn test_baseline_reading() {
        let out = compute(&ModelInputs::default()).unwrap();
        let i = &out.interpretation;

        assert_eq!(i.ebitda_margin, EbitdaMarginBand::Exceptional);
        assert_eq!(i.net_margin, NetMarginBand::Excellent);
        assert_eq!(i.margin_of_safety, SafetyBand::Robust);
        assert_eq!(i.unit_economics, UnitEconomicsBand::Healthy);
        assert_eq!(i.cost_structure, CostStructureBand::VariableHeavy);
        assert_eq!(i.cost_efficiency, CostEfficiencyBand::Excellent);
        assert_eq!(i.admin_burden, AdminBurdenBand::Lean);
        assert_eq!(i.npv, NpvVerdict::ValueCreating);
        assert_eq!(i.irr, IrrVerdict::AboveHurdle);
        assert_eq!(i.payback, PaybackQuality::Excellent);
        assert_eq!(i.stress_resilience, ResilienceBand::Adequate);
        assert_eq!(i.strategic_position, StrategicPosition::MarketLeader);
        assert_eq!(i.recommendation, Recommendation::StrongBuy);
    }

    #[test]
    fn test_unviable_clinic() {
        let input = ModelInputs {
            patients: 40,
            ..ModelInputs::default()
        };
        let out = compute(&input).unwrap();
        let i = &out.interpretation;

        assert_eq!(i.ebitda_margin, EbitdaMarginBand::Critical);
        assert_eq!(i.margin_of_safety, SafetyBand::Critical);
        assert_eq!(i.npv, NpvVerdict::ValueDestroying);
        assert_eq!(i.payback, PaybackQuality::NotRecovered);
        assert_eq!(i.implied_multiple, None);
        assert_eq!(i.stress_resilience, ResilienceBand::Fragile);
        assert_eq!(i.strategic_position, StrategicPosition::Challenged);
        assert_eq!(i.recommendation, Recommendation::Avoid);
    }

    #[test]
    fn test_undefined_breakeven_fails_every_tier() {
        let input = ModelInputs {
            tariff: dec!(20),
            ..ModelInputs::default()
        };
        let out = compute(&input).unwrap();
        assert_eq!(out.interpretation.margin_of_safety, SafetyBand::Undefined);
        assert_eq!(
            strategic_position(&out.key_metrics, &out.breakeven),
            StrategicPosition::Challenged
        );
    }
}
