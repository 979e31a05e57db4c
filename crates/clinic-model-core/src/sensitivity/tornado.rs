use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::inputs::ModelInputs;
use crate::pnl::income_statement::{build_income_statement, IncomeStatement};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ClinicModelResult;

const LOW_FACTOR: Decimal = dec!(0.8);
const HIGH_FACTOR: Decimal = dec!(1.2);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A single EBITDA driver flexed one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TornadoDriver {
    Volume,
    Tariff,
    ClinicalCosts,
    DrugCosts,
    LabCosts,
    AdminCosts,
    OtherOpex,
}

/// One bar of the tornado chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoBar {
    pub driver: TornadoDriver,
    pub label: String,
    pub base_value: Decimal,
    /// EBITDA change with the driver at 80% of base
    pub delta_low: Money,
    /// EBITDA change with the driver at 120% of base
    pub delta_high: Money,
    /// |delta_high - delta_low|
    pub swing: Money,
}

impl TornadoDriver {
    pub const ALL: [TornadoDriver; 7] = [
        TornadoDriver::Volume,
        TornadoDriver::Tariff,
        TornadoDriver::ClinicalCosts,
        TornadoDriver::DrugCosts,
        TornadoDriver::LabCosts,
        TornadoDriver::AdminCosts,
        TornadoDriver::OtherOpex,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TornadoDriver::Volume => "Volume (patients)",
            TornadoDriver::Tariff => "Tariff",
            TornadoDriver::ClinicalCosts => "Clinical costs",
            TornadoDriver::DrugCosts => "Drug costs",
            TornadoDriver::LabCosts => "Lab costs",
            TornadoDriver::AdminCosts => "Admin costs",
            TornadoDriver::OtherOpex => "Other OpEx",
        }
    }

    /// Value of the driver in the base case: a patient count, a tariff, or an
    /// annual cost line.
    pub fn base_value(&self, input: &ModelInputs, pnl: &IncomeStatement) -> Decimal {
        match self {
            TornadoDriver::Volume => input.patients_dec(),
            TornadoDriver::Tariff => input.tariff,
            TornadoDriver::ClinicalCosts => pnl.clinical_staff.annual,
            TornadoDriver::DrugCosts => pnl.drugs.annual,
            TornadoDriver::LabCosts => pnl.labs.annual,
            TornadoDriver::AdminCosts => pnl.admin_staff.annual,
            TornadoDriver::OtherOpex => pnl.other_opex.annual,
        }
    }

    /// Annual EBITDA with this driver set to `x` and everything else at base.
    ///
    /// Only the volume driver rescales drugs and labs. A tariff move keeps
    /// variable costs at their base absolute amount.
    pub fn ebitda_at(&self, input: &ModelInputs, pnl: &IncomeStatement, x: Decimal) -> Money {
        let rev_y = pnl.revenue.annual;
        let clinical = pnl.clinical_staff.annual;
        let drugs = pnl.drugs.annual;
        let labs = pnl.labs.annual;
        let admin = pnl.admin_staff.annual;
        let other = pnl.other_opex.annual;
        let total = clinical + drugs + labs + admin + other;

        match self {
            TornadoDriver::Volume => {
                let patients = input.patients_dec();
                let variable = if patients.is_zero() {
                    Decimal::ZERO
                } else {
                    (drugs + labs) * x / patients
                };
                x * input.tariff - (clinical + variable + admin + other)
            }
            TornadoDriver::Tariff => input.patients_dec() * x - total,
            TornadoDriver::ClinicalCosts => rev_y - (x + drugs + labs + admin + other),
            TornadoDriver::DrugCosts => rev_y - (clinical + x + labs + admin + other),
            TornadoDriver::LabCosts => rev_y - (clinical + drugs + x + admin + other),
            TornadoDriver::AdminCosts => rev_y - (clinical + drugs + labs + x + other),
            TornadoDriver::OtherOpex => rev_y - (clinical + drugs + labs + admin + x),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Flex every driver to 80% and 120% of its base value. Drivers with a zero
/// base are left out. Bars come back sorted by swing, widest first.
pub fn build_tornado(input: &ModelInputs, pnl: &IncomeStatement) -> Vec<TornadoBar> {
    let base_ebitda = pnl.ebitda.annual;

    let mut bars: Vec<TornadoBar> = TornadoDriver::ALL
        .iter()
        .filter_map(|driver| {
            let base_value = driver.base_value(input, pnl);
            if base_value.is_zero() {
                return None;
            }
            let delta_low = driver.ebitda_at(input, pnl, base_value * LOW_FACTOR) - base_ebitda;
            let delta_high = driver.ebitda_at(input, pnl, base_value * HIGH_FACTOR) - base_ebitda;
            Some(TornadoBar {
                driver: *driver,
                label: driver.label().to_string(),
                base_value,
                delta_low,
                delta_high,
                swing: (delta_high - delta_low).abs(),
            })
        })
        .collect();

    bars.sort_by(|a, b| b.swing.cmp(&a.swing));
    bars
}

/// Tornado analysis wrapped in the standard output envelope.
pub fn analyze_tornado(input: &ModelInputs) -> ClinicModelResult<ComputationOutput<Vec<TornadoBar>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let pnl = build_income_statement(input);
    let bars = build_tornado(input, &pnl);

    let skipped: Vec<&str> = TornadoDriver::ALL
        .iter()
        .filter(|d| !bars.iter().any(|b| b.driver == **d))
        .map(|d| d.label())
        .collect();
    if !skipped.is_empty() {
        warnings.push(format!(
            "Drivers with a zero base value were skipped: {}",
            skipped.join(", ")
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-at-a-time EBITDA sensitivity (±20% per driver)",
        &serde_json::json!({
            "low_factor": LOW_FACTOR.to_string(),
            "high_factor": HIGH_FACTOR.to_string(),
            "base_ebitda": pnl.ebitda.annual.to_string(),
        }),
        warnings,
        elapsed,
        bars,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const TOL: Decimal = dec!(0.000001);

    fn bars_for(input: &ModelInputs) -> Vec<TornadoBar> {
        build_tornado(input, &build_income_statement(input))
    }

    fn bar(bars: &[TornadoBar], driver: TornadoDriver) -> &TornadoBar {
        bars.iter().find(|b| b.driver == driver).unwrap()
    }

    #[test]
    fn test_baseline_ordering() {
        let bars = bars_for(&ModelInputs::default());
        assert_eq!(bars.len(), 7);
        assert_eq!(bars[0].driver, TornadoDriver::Tariff);
        assert_eq!(bars[1].driver, TornadoDriver::Volume);
        for pair in bars.windows(2) {
            assert!(pair[0].swing >= pair[1].swing);
        }
    }

    #[test]
    fn test_tariff_swing() {
        let bars = bars_for(&ModelInputs::default());
        // 0.4 * 250 * 54
        assert!((bar(&bars, TornadoDriver::Tariff).swing - dec!(5400)).abs() < TOL);
    }

    #[test]
    fn test_volume_rescales_variable_costs() {
        let bars = bars_for(&ModelInputs::default());
        let volume = bar(&bars, TornadoDriver::Volume);
        // +20% volume: +50 patients * 54 less 20% of (4824 + 612)
        assert!((volume.delta_high - dec!(1612.8)).abs() < TOL);
        assert!((volume.delta_low + dec!(1612.8)).abs() < TOL);
        assert!((volume.swing - dec!(3225.6)).abs() < TOL);

        // The tariff driver keeps variable costs fixed, so it swings wider
        // than volume even though both scale revenue by the same amount.
        let tariff = bar(&bars, TornadoDriver::Tariff);
        assert!(tariff.swing > volume.swing);
    }

    #[test]
    fn test_cost_drivers_move_against_ebitda() {
        let bars = bars_for(&ModelInputs::default());
        let drugs = bar(&bars, TornadoDriver::DrugCosts);
        assert!((drugs.delta_high - dec!(-964.8)).abs() < TOL);
        assert!((drugs.delta_low - dec!(964.8)).abs() < TOL);

        let clinical = bar(&bars, TornadoDriver::ClinicalCosts);
        assert!((clinical.swing - dec!(415.5)).abs() < TOL);
    }

    #[test]
    fn test_zero_base_driver_skipped() {
        let input = ModelInputs {
            labs_base: Decimal::ZERO,
            ..ModelInputs::default()
        };
        let bars = bars_for(&input);
        assert_eq!(bars.len(), 6);
        assert!(bars.iter().all(|b| b.driver != TornadoDriver::LabCosts));

        let out = analyze_tornado(&input).unwrap();
        assert!(out.warnings[0].contains("Lab costs"));
    }

    #[test]
    fn test_zero_patients_skips_volume_and_variable_costs() {
        let input = ModelInputs {
            patients: 0,
            ..ModelInputs::default()
        };
        let bars = bars_for(&input);
        let drivers: Vec<TornadoDriver> = bars.iter().map(|b| b.driver).collect();
        assert!(!drivers.contains(&TornadoDriver::Volume));
        assert!(!drivers.contains(&TornadoDriver::DrugCosts));
        assert!(!drivers.contains(&TornadoDriver::LabCosts));
        // Tariff has a non-zero base but no volume to act on
        assert_eq!(bar(&bars, TornadoDriver::Tariff).swing, Decimal::ZERO);
    }
}
