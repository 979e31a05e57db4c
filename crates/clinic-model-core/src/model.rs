use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::breakeven::{
    breakeven_frontier, build_breakeven, cvp::breakeven_warnings, BreakevenOutput, FrontierPoint,
};
use crate::inputs::{validate_inputs, ModelInputs};
use crate::pnl::{build_income_statement, compute_key_metrics, IncomeStatement, KeyMetrics};
use crate::sensitivity::{
    build_npv_grid, build_tornado, build_volume_tariff_grid, NpvGrid, TornadoBar, VolumeTariffGrid,
};
use crate::stress::{run_stress_scenarios, StressTestOutput};
use crate::types::{with_metadata, ComputationOutput, Currency};
use crate::valuation::{build_cash_flows, build_valuation, ValuationOutput};
use crate::ClinicModelResult;

#[cfg(feature = "interpretation")]
use crate::interpretation::{interpret, Interpretation};

/// Everything the model derives from one set of inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelOutputs {
    pub currency: Currency,
    pub income_statement: IncomeStatement,
    pub key_metrics: KeyMetrics,
    pub breakeven: BreakevenOutput,
    pub breakeven_frontier: Vec<FrontierPoint>,
    pub valuation: ValuationOutput,
    pub tornado: Vec<TornadoBar>,
    pub volume_tariff_grid: VolumeTariffGrid,
    pub npv_grid: NpvGrid,
    pub stress: StressTestOutput,
    #[cfg(feature = "interpretation")]
    pub interpretation: Interpretation,
}

/// Run every engine on `input`. Pure: the same inputs always give the same
/// outputs. Inputs are not range-checked here; see [`run_model`].
pub fn compute(input: &ModelInputs) -> ClinicModelResult<ModelOutputs> {
    compute_with_warnings(input).map(|(outputs, _)| outputs)
}

/// Validate, compute and wrap the full model in the standard envelope. Every
/// undefined figure is listed in the envelope's warnings.
pub fn run_model(input: &ModelInputs) -> ClinicModelResult<ComputationOutput<ModelOutputs>> {
    let start = Instant::now();
    validate_inputs(input)?;

    let (outputs, warnings) = compute_with_warnings(input)?;
    for w in &warnings {
        warn!("{w}");
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Outpatient clinic model: P&L, CVP break-even, 5-year DCF, sensitivity and stress",
        input,
        warnings,
        elapsed,
        outputs,
    ))
}

fn compute_with_warnings(input: &ModelInputs) -> ClinicModelResult<(ModelOutputs, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();

    let income_statement = build_income_statement(input);
    let key_metrics = compute_key_metrics(input, &income_statement);
    debug!(
        revenue = %income_statement.revenue.annual,
        ebitda = %income_statement.ebitda.annual,
        "income statement built"
    );
    if income_statement.ebitda.annual < Decimal::ZERO {
        warnings.push("EBITDA is negative; no income tax is assessed".into());
    }

    let breakeven = build_breakeven(input, &income_statement);
    warnings.extend(breakeven_warnings(input, &breakeven));
    let frontier = breakeven_frontier(
        breakeven.fixed_costs_y,
        breakeven.var_cost_per_patient_y,
        input.patients,
    );
    debug!(breakeven_patients = ?breakeven.breakeven_patients, "break-even computed");

    let cash_flows = build_cash_flows(input, income_statement.net_profit.annual);
    let (cf0, cf1) = (cash_flows.years[0].cash_flow, cash_flows.years[1].cash_flow);
    let valuation = build_valuation(
        input,
        cash_flows,
        income_statement.ebitda.annual,
        &mut warnings,
    )?;
    debug!(npv = %valuation.npv, irr = ?valuation.irr, "valuation computed");

    let tornado = build_tornado(input, &income_statement);
    let volume_tariff_grid = build_volume_tariff_grid(input, &income_statement);
    let npv_grid = build_npv_grid(input, cf0, cf1)?;
    debug!(
        drivers = tornado.len(),
        profitable_share = %volume_tariff_grid.profitable_share,
        "sensitivity computed"
    );

    let stress = run_stress_scenarios(input, &income_statement);
    if stress.summary.base_ebitda.is_zero() {
        warnings.push("Base EBITDA is zero; stress impacts are reported as -100%".into());
    }
    debug!(worst_ebitda = %stress.summary.worst_ebitda, "stress scenarios computed");

    #[cfg(feature = "interpretation")]
    let interpretation = interpret(&key_metrics, &breakeven, &valuation, &stress.summary);

    let outputs = ModelOutputs {
        currency: input.currency,
        income_statement,
        key_metrics,
        breakeven,
        breakeven_frontier: frontier,
        valuation,
        tornado,
        volume_tariff_grid,
        npv_grid,
        stress,
        #[cfg(feature = "interpretation")]
        interpretation,
    };
    Ok((outputs, warnings))
}
