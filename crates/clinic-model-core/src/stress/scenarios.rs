use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::inputs::ModelInputs;
use crate::pnl::income_statement::{build_income_statement, IncomeStatement};
use crate::types::{safe_divide, with_metadata, ComputationOutput, Money, Rate};
use crate::ClinicModelResult;

/// Patient volume retained in the volume-decline scenarios.
const VOLUME_RETAINED: Decimal = dec!(0.85);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The fixed set of adverse scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressScenario {
    /// Part of the volume billed at the low tariff
    PayerMixErosion,
    /// 15% fewer patients
    VolumeDecline,
    /// Clinical payroll inflated by `stress_costs`
    ClinicalCostInflation,
    /// All of the above at once
    CombinedStress,
}

/// EBITDA outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    pub scenario: StressScenario,
    pub name: String,
    pub description: String,
    pub revenue: Money,
    pub ebitda: Money,
    /// ebitda / scenario revenue, 0 when there is no revenue
    pub margin: Rate,
    /// Change against base EBITDA in percent; -100 when base EBITDA is zero
    pub impact_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressSummary {
    pub base_ebitda: Money,
    pub base_margin: Rate,
    /// Combined-stress EBITDA
    pub worst_ebitda: Money,
    pub min_ebitda: Money,
    /// base_ebitda - min_ebitda
    pub max_drawdown: Money,
    pub drawdown_pct: Rate,
    /// Share of base EBITDA kept under combined stress, 0..=100
    pub resilience_score: Decimal,
    /// Single-factor scenario with the largest absolute impact
    pub primary_risk: Option<StressScenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestOutput {
    pub scenarios: Vec<StressResult>,
    pub summary: StressSummary,
}

/// Annual figures every scenario starts from.
struct Baseline {
    patients: Decimal,
    clinical: Money,
    variable: Money,
    admin: Money,
    other: Money,
}

impl Baseline {
    fn from_pnl(input: &ModelInputs, pnl: &IncomeStatement) -> Self {
        Self {
            patients: input.patients_dec(),
            clinical: pnl.clinical_staff.annual,
            variable: pnl.drugs.annual + pnl.labs.annual,
            admin: pnl.admin_staff.annual,
            other: pnl.other_opex.annual,
        }
    }

    fn costs(&self) -> Money {
        self.clinical + self.variable + self.admin + self.other
    }
}

impl StressScenario {
    pub const ALL: [StressScenario; 4] = [
        StressScenario::PayerMixErosion,
        StressScenario::VolumeDecline,
        StressScenario::ClinicalCostInflation,
        StressScenario::CombinedStress,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StressScenario::PayerMixErosion => "Payer Mix Erosion",
            StressScenario::VolumeDecline => "Volume Decline",
            StressScenario::ClinicalCostInflation => "Clinical Cost Inflation",
            StressScenario::CombinedStress => "Combined Stress",
        }
    }

    pub fn description(&self, input: &ModelInputs) -> String {
        match self {
            StressScenario::PayerMixErosion => format!(
                "{:.0}% patients at {}{:.0}k tariff",
                input.mix_low_pct * dec!(100),
                input.currency.symbol(),
                input.low_tariff
            ),
            StressScenario::VolumeDecline => "15% patient volume reduction".to_string(),
            StressScenario::ClinicalCostInflation => format!(
                "{:.0}% clinical cost increase",
                input.stress_costs * dec!(100)
            ),
            StressScenario::CombinedStress => "All adverse conditions".to_string(),
        }
    }

    /// Scenario (revenue, EBITDA).
    fn evaluate(&self, input: &ModelInputs, base: &Baseline) -> (Money, Money) {
        let mixed_tariff = (Decimal::ONE - input.mix_low_pct) * input.tariff
            + input.mix_low_pct * input.low_tariff;
        let inflated_clinical = base.clinical * (Decimal::ONE + input.stress_costs);
        let reduced_patients = base.patients * VOLUME_RETAINED;
        let reduced_variable = base.variable * VOLUME_RETAINED;

        match self {
            StressScenario::PayerMixErosion => {
                let rev = base.patients * mixed_tariff;
                (rev, rev - base.costs())
            }
            StressScenario::VolumeDecline => {
                let rev = reduced_patients * input.tariff;
                (rev, rev - (base.clinical + reduced_variable + base.admin + base.other))
            }
            StressScenario::ClinicalCostInflation => {
                let rev = base.patients * input.tariff;
                (rev, rev - (inflated_clinical + base.variable + base.admin + base.other))
            }
            StressScenario::CombinedStress => {
                let rev = reduced_patients * mixed_tariff;
                (rev, rev - (inflated_clinical + reduced_variable + base.admin + base.other))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate every stress scenario against the plan.
pub fn run_stress_scenarios(input: &ModelInputs, pnl: &IncomeStatement) -> StressTestOutput {
    let base = Baseline::from_pnl(input, pnl);
    let base_rev = base.patients * input.tariff;
    let base_ebitda = base_rev - base.costs();

    let scenarios: Vec<StressResult> = StressScenario::ALL
        .iter()
        .map(|scenario| {
            let (revenue, ebitda) = scenario.evaluate(input, &base);
            StressResult {
                scenario: *scenario,
                name: scenario.name().to_string(),
                description: scenario.description(input),
                revenue,
                ebitda,
                margin: safe_divide(ebitda, revenue, Decimal::ZERO),
                impact_pct: safe_divide((ebitda - base_ebitda) * dec!(100), base_ebitda, dec!(-100)),
            }
        })
        .collect();

    let summary = summarize(base_ebitda, base_rev, &scenarios);
    StressTestOutput { scenarios, summary }
}

/// Stress test wrapped in the standard output envelope.
pub fn analyze_stress(input: &ModelInputs) -> ClinicModelResult<ComputationOutput<StressTestOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let pnl = build_income_statement(input);
    let output = run_stress_scenarios(input, &pnl);

    if output.summary.base_ebitda.is_zero() {
        warnings.push("Base EBITDA is zero; scenario impacts are reported as -100%".into());
    }
    if input.low_tariff > input.tariff {
        warnings.push("Low tariff exceeds the plan tariff; payer mix erosion is not adverse".into());
    }
    for r in output.scenarios.iter().filter(|r| r.ebitda < Decimal::ZERO) {
        warnings.push(format!("{} pushes EBITDA below zero", r.name));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Deterministic stress scenarios (payer mix, volume, clinical cost)",
        &serde_json::json!({
            "mix_low_pct": input.mix_low_pct.to_string(),
            "low_tariff": input.low_tariff.to_string(),
            "stress_costs": input.stress_costs.to_string(),
            "volume_retained": VOLUME_RETAINED.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn summarize(base_ebitda: Money, base_rev: Money, scenarios: &[StressResult]) -> StressSummary {
    let min_ebitda = scenarios
        .iter()
        .map(|s| s.ebitda)
        .min()
        .unwrap_or(base_ebitda);
    let worst_ebitda = scenarios
        .iter()
        .find(|s| s.scenario == StressScenario::CombinedStress)
        .map(|s| s.ebitda)
        .unwrap_or(min_ebitda);
    let max_drawdown = base_ebitda - min_ebitda;

    let resilience_score = if base_ebitda > Decimal::ZERO {
        match (worst_ebitda * dec!(100)).checked_div(base_ebitda) {
            Some(score) => score.max(Decimal::ZERO).min(dec!(100)),
            // Ratio beyond Decimal range: the sign decides the clamp
            None if worst_ebitda > Decimal::ZERO => dec!(100),
            None => Decimal::ZERO,
        }
    } else {
        Decimal::ZERO
    };

    // Ties go to the earliest single-factor scenario
    let primary_risk = scenarios
        .iter()
        .filter(|s| s.scenario != StressScenario::CombinedStress)
        .fold(None::<&StressResult>, |best, s| match best {
            Some(b) if b.impact_pct.abs() >= s.impact_pct.abs() => Some(b),
            _ => Some(s),
        })
        .map(|s| s.scenario);

    StressSummary {
        base_ebitda,
        base_margin: safe_divide(base_ebitda, base_rev, Decimal::ZERO),
        worst_ebitda,
        min_ebitda,
        max_drawdown,
        drawdown_pct: safe_divide(max_drawdown, base_ebitda, Decimal::ZERO),
        resilience_score,
        primary_risk,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.000001);

    fn stress_for(input: &ModelInputs) -> StressTestOutput {
        run_stress_scenarios(input, &build_income_statement(input))
    }

    fn ebitda_of(out: &StressTestOutput, scenario: StressScenario) -> Money {
        out.scenarios
            .iter()
            .find(|s| s.scenario == scenario)
            .map(|s| s.ebitda)
            .unwrap()
    }

    #[test]
    fn test_baseline_scenarios() {
        let out = stress_for(&ModelInputs::default());
        assert_eq!(out.scenarios.len(), 4);
        assert!((out.summary.base_ebitda - dec!(6308.75)).abs() < TOL);

        // 75 patients lose 12 of tariff: -900
        let mix = ebitda_of(&out, StressScenario::PayerMixErosion);
        assert!((mix - dec!(5408.75)).abs() < TOL);

        // -15% revenue (2025) offset by -15% variable cost (815.4)
        let vol = ebitda_of(&out, StressScenario::VolumeDecline);
        assert!((vol - dec!(5099.15)).abs() < TOL);

        // +10% of 1038.75
        let cost = ebitda_of(&out, StressScenario::ClinicalCostInflation);
        assert!((cost - dec!(6204.875)).abs() < TOL);
    }

    #[test]
    fn test_combined_is_worst() {
        for input in [
            ModelInputs::default(),
            ModelInputs {
                mix_low_pct: dec!(0.6),
                stress_costs: dec!(0.3),
                ..ModelInputs::default()
            },
            ModelInputs {
                patients: 80,
                ..ModelInputs::default()
            },
        ] {
            let out = stress_for(&input);
            let combined = ebitda_of(&out, StressScenario::CombinedStress);
            for s in &out.scenarios {
                assert!(combined <= s.ebitda, "{} beat combined", s.name);
            }
            assert_eq!(out.summary.worst_ebitda, combined);
            assert_eq!(out.summary.min_ebitda, combined);
        }
    }

    #[test]
    fn test_descriptions() {
        let out = stress_for(&ModelInputs::default());
        assert_eq!(out.scenarios[0].name, "Payer Mix Erosion");
        assert_eq!(out.scenarios[0].description, "30% patients at $42k tariff");
        assert_eq!(out.scenarios[2].description, "10% clinical cost increase");
        assert_eq!(out.scenarios[3].description, "All adverse conditions");
    }

    #[test]
    fn test_impact_and_margin() {
        let out = stress_for(&ModelInputs::default());
        let mix = &out.scenarios[0];
        // -900 / 6308.75 * 100
        assert!((mix.impact_pct - dec!(-900) * dec!(100) / dec!(6308.75)).abs() < TOL);
        assert!((mix.margin - mix.ebitda / dec!(12600)).abs() < TOL);
    }

    #[test]
    fn test_zero_base_ebitda_impact_sentinel() {
        // Tariff that exactly covers costs: base EBITDA 0
        let base = ModelInputs {
            patients: 100,
            ..ModelInputs::default()
        };
        let pnl = build_income_statement(&base);
        let input = ModelInputs {
            tariff: pnl.total_costs_y() / dec!(100),
            ..base
        };
        let out = stress_for(&input);
        if out.summary.base_ebitda.is_zero() {
            assert!(out.scenarios.iter().all(|s| s.impact_pct == dec!(-100)));
            assert_eq!(out.summary.resilience_score, Decimal::ZERO);
        } else {
            assert!(out.summary.base_ebitda.abs() < TOL);
        }
    }

    #[test]
    fn test_zero_revenue_margin_guarded() {
        let input = ModelInputs {
            patients: 0,
            ..ModelInputs::default()
        };
        let out = stress_for(&input);
        assert!(out.scenarios.iter().all(|s| s.margin.is_zero()));
        assert!(out.summary.base_ebitda < Decimal::ZERO);
        assert_eq!(out.summary.resilience_score, Decimal::ZERO);
    }

    #[test]
    fn test_summary() {
        let out = stress_for(&ModelInputs::default());
        let s = &out.summary;
        assert_eq!(s.max_drawdown, s.base_ebitda - s.min_ebitda);
        assert!(s.resilience_score > Decimal::ZERO && s.resilience_score < dec!(100));
        // Volume decline (-1209.6) hurts more than payer mix (-900)
        assert_eq!(s.primary_risk, Some(StressScenario::VolumeDecline));
    }

    fn result_with_impact(scenario: StressScenario, impact_pct: Decimal) -> StressResult {
        StressResult {
            scenario,
            name: scenario.name().to_string(),
            description: String::new(),
            revenue: Decimal::ZERO,
            ebitda: dec!(-10),
            margin: Decimal::ZERO,
            impact_pct,
        }
    }

    #[test]
    fn test_primary_risk_tie_goes_to_payer_mix() {
        // Zero base EBITDA: every scenario reports the -100 sentinel
        let scenarios: Vec<StressResult> = StressScenario::ALL
            .iter()
            .map(|sc| result_with_impact(*sc, dec!(-100)))
            .collect();
        let summary = summarize(Decimal::ZERO, dec!(100), &scenarios);
        assert_eq!(summary.primary_risk, Some(StressScenario::PayerMixErosion));
        assert_eq!(summary.resilience_score, Decimal::ZERO);
    }

    #[test]
    fn test_primary_risk_tie_between_later_scenarios() {
        let scenarios = vec![
            result_with_impact(StressScenario::PayerMixErosion, dec!(-5)),
            result_with_impact(StressScenario::VolumeDecline, dec!(-20)),
            result_with_impact(StressScenario::ClinicalCostInflation, dec!(-20)),
            result_with_impact(StressScenario::CombinedStress, dec!(-60)),
        ];
        let summary = summarize(dec!(50), dec!(100), &scenarios);
        assert_eq!(summary.primary_risk, Some(StressScenario::VolumeDecline));
    }

    #[test]
    fn test_resilience_with_tiny_base_does_not_overflow() {
        let scenarios = vec![result_with_impact(StressScenario::CombinedStress, dec!(-100))];
        let tiny = dec!(0.0000000000000000000000000001);
        let summary = summarize(tiny, dec!(100), &scenarios);
        assert_eq!(summary.resilience_score, Decimal::ZERO);

        let healthy = StressResult {
            ebitda: dec!(5000),
            ..result_with_impact(StressScenario::CombinedStress, dec!(10))
        };
        let summary = summarize(tiny, dec!(100), &[healthy]);
        assert_eq!(summary.resilience_score, dec!(100));
    }
}
