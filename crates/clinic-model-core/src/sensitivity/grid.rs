use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::breakeven::cvp::variable_cost_per_patient_y;
use crate::breakeven::frontier::linspace;
use crate::inputs::ModelInputs;
use crate::pnl::income_statement::{build_income_statement, IncomeStatement};
use crate::time_value::npv;
use crate::types::{safe_divide, with_metadata, ComputationOutput, Money, Rate};
use crate::valuation::cash_flow::{build_cash_flows, project_flows};
use crate::ClinicModelResult;

const GRID_STEPS: u32 = 14;
const DISCOUNT_POINTS: usize = 7;
const GROWTH_POINTS: usize = 9;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// EBITDA over a patients × tariff grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeTariffGrid {
    /// Column axis
    pub patients: Vec<u32>,
    /// Row axis
    pub tariffs: Vec<Money>,
    /// ebitda[i][j] = EBITDA at tariffs[i], patients[j]
    pub ebitda: Vec<Vec<Money>>,
    /// (row, col) of the planned tariff and volume
    pub current_position: (usize, usize),
    /// Share of cells with EBITDA >= 0
    pub profitable_share: Rate,
}

/// NPV over a discount rate × growth rate grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvGrid {
    /// Row axis
    pub discount_rates: Vec<Rate>,
    /// Column axis
    pub growth_rates: Vec<Rate>,
    /// npv[i][j] = NPV at discount_rates[i], growth_rates[j]
    pub npv: Vec<Vec<Money>>,
    pub summary: NpvGridSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpvGridSummary {
    pub min_npv: Money,
    pub max_npv: Money,
    pub spread: Money,
    /// Cell nearest the modelled (ke, rev_growth)
    pub model_position: (usize, usize),
    pub model_cell_npv: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Patients axis centred on the plan: 55%..145% of volume (never below 30)
/// in roughly 14 steps, with the planned volume always present.
pub fn patients_axis(patients: u32) -> Vec<u32> {
    let lo = (u64::from(patients) * 55 / 100).max(30);
    let hi = u64::from(patients) * 145 / 100;
    let step = (hi.saturating_sub(lo) / u64::from(GRID_STEPS)).max(1);

    let mut axis: Vec<u32> = if hi >= lo {
        (lo..=hi)
            .step_by(step as usize)
            .filter_map(|p| u32::try_from(p).ok())
            .collect()
    } else {
        Vec::new()
    };
    if let Err(pos) = axis.binary_search(&patients) {
        axis.insert(pos, patients);
    }
    axis
}

/// Tariff axis: 65%..135% of the tariff (never below 10), one decimal place,
/// step at least 0.5, with the planned tariff always present.
pub fn tariff_axis(tariff: Money) -> Vec<Money> {
    let lo = (tariff * dec!(0.65)).round_dp(1).max(dec!(10));
    let hi = (tariff * dec!(1.35)).round_dp(1);
    let step = ((hi - lo) / Decimal::from(GRID_STEPS)).max(dec!(0.5));

    let mut axis = Vec::new();
    let mut k = Decimal::ZERO;
    loop {
        let raw = lo + k * step;
        if raw > hi + dec!(0.001) {
            break;
        }
        axis.push(raw.round_dp(1));
        k += Decimal::ONE;
    }
    if let Err(pos) = axis.binary_search(&tariff) {
        axis.insert(pos, tariff);
    }
    axis
}

/// EBITDA for every (tariff, patients) pair, fixed costs held at plan.
pub fn build_volume_tariff_grid(input: &ModelInputs, pnl: &IncomeStatement) -> VolumeTariffGrid {
    let patients = patients_axis(input.patients);
    let tariffs = tariff_axis(input.tariff);
    let var_pp_y = variable_cost_per_patient_y(input);
    let fixed_y = pnl.fixed_costs_y();

    let ebitda: Vec<Vec<Money>> = tariffs
        .iter()
        .map(|t| {
            patients
                .iter()
                .map(|p| {
                    let p = Decimal::from(*p);
                    p * t - var_pp_y * p - fixed_y
                })
                .collect()
        })
        .collect();

    let total_cells = tariffs.len() * patients.len();
    let profitable = ebitda
        .iter()
        .flatten()
        .filter(|e| **e >= Decimal::ZERO)
        .count();

    let row = tariffs.iter().position(|t| *t == input.tariff).unwrap_or(0);
    let col = patients.iter().position(|p| *p == input.patients).unwrap_or(0);

    VolumeTariffGrid {
        patients,
        tariffs,
        ebitda,
        current_position: (row, col),
        profitable_share: safe_divide(
            Decimal::from(profitable as u64),
            Decimal::from(total_cells as u64),
            Decimal::ZERO,
        ),
    }
}

/// Discount rates: 7 points over [max(8%, ke - 6pp), ke + 6pp].
pub fn discount_axis(ke: Rate) -> Vec<Rate> {
    linspace((ke - dec!(0.06)).max(dec!(0.08)), ke + dec!(0.06), DISCOUNT_POINTS)
        .into_iter()
        .map(|r| r.round_dp(4))
        .collect()
}

/// Growth rates: 9 points over [max(-5%, g - 8pp), g + 15pp].
pub fn growth_axis(growth: Rate) -> Vec<Rate> {
    linspace((growth - dec!(0.08)).max(dec!(-0.05)), growth + dec!(0.15), GROWTH_POINTS)
        .into_iter()
        .map(|g| g.round_dp(4))
        .collect()
}

/// Re-project the cash flows under each growth rate and discount them at
/// each rate. `cf0` and `cf1` are taken from the plan.
pub fn build_npv_grid(input: &ModelInputs, cf0: Money, cf1: Money) -> ClinicModelResult<NpvGrid> {
    let discount_rates = discount_axis(input.ke);
    let growth_rates = growth_axis(input.rev_growth);

    let mut matrix = Vec::with_capacity(discount_rates.len());
    for rate in &discount_rates {
        let mut row = Vec::with_capacity(growth_rates.len());
        for g in &growth_rates {
            row.push(npv(*rate, &project_flows(cf0, cf1, *g))?);
        }
        matrix.push(row);
    }

    let mut min_npv = matrix[0][0];
    let mut max_npv = matrix[0][0];
    for v in matrix.iter().flatten() {
        min_npv = min_npv.min(*v);
        max_npv = max_npv.max(*v);
    }

    let i = closest_index(&discount_rates, input.ke);
    let j = closest_index(&growth_rates, input.rev_growth);
    let summary = NpvGridSummary {
        min_npv,
        max_npv,
        spread: max_npv - min_npv,
        model_position: (i, j),
        model_cell_npv: matrix[i][j],
    };

    Ok(NpvGrid {
        discount_rates,
        growth_rates,
        npv: matrix,
        summary,
    })
}

/// Patients × tariff EBITDA grid in the standard output envelope.
pub fn analyze_volume_tariff_grid(
    input: &ModelInputs,
) -> ClinicModelResult<ComputationOutput<VolumeTariffGrid>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let pnl = build_income_statement(input);
    let grid = build_volume_tariff_grid(input, &pnl);
    if grid.profitable_share.is_zero() {
        warnings.push("No patients × tariff combination in the grid is profitable".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-way EBITDA sensitivity (patients × tariff, fixed costs at plan)",
        &serde_json::json!({
            "patients": input.patients,
            "tariff": input.tariff.to_string(),
            "fixed_costs_y": pnl.fixed_costs_y().to_string(),
        }),
        warnings,
        elapsed,
        grid,
    ))
}

/// Discount × growth NPV grid in the standard output envelope.
pub fn analyze_npv_grid(input: &ModelInputs) -> ClinicModelResult<ComputationOutput<NpvGrid>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let pnl = build_income_statement(input);
    let flows = build_cash_flows(input, pnl.net_profit.annual).flows();
    let grid = build_npv_grid(input, flows[0], flows[1])?;
    if grid.summary.max_npv < Decimal::ZERO {
        warnings.push("NPV is negative across the whole discount × growth grid".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Two-way NPV sensitivity (discount rate × growth rate)",
        &serde_json::json!({
            "ke": input.ke.to_string(),
            "rev_growth": input.rev_growth.to_string(),
            "cf0": flows[0].to_string(),
            "cf1": flows[1].to_string(),
        }),
        warnings,
        elapsed,
        grid,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
