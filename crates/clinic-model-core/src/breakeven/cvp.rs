use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::inputs::ModelInputs;
use crate::pnl::income_statement::{build_income_statement, IncomeStatement};
use crate::types::{safe_divide, with_metadata, ComputationOutput, Money, Rate};
use crate::ClinicModelResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Cost-volume-profit view of the clinic.
///
/// `None` marks a figure with no finite answer for the inputs (for example
/// break-even volume when each patient contributes nothing). It is never a
/// stand-in for zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakevenOutput {
    /// Drugs + labs per patient per year, contingency included
    pub var_cost_per_patient_y: Money,
    /// max(tariff - var_cost_per_patient_y, 0)
    pub contribution_per_patient: Money,
    /// contribution / tariff
    pub contribution_margin_pct: Rate,
    /// Clinical + admin + other opex
    pub fixed_costs_y: Money,
    /// fixed_costs_y / contribution_per_patient
    pub breakeven_patients: Option<Decimal>,
    pub breakeven_revenue: Option<Money>,
    /// patients - breakeven_patients; negative when the plan is below break-even
    pub margin_of_safety_patients: Option<Decimal>,
    /// Margin of safety clamped at zero for display
    pub margin_of_safety_patients_display: Option<Decimal>,
    /// margin_of_safety_patients / patients
    pub margin_of_safety_pct: Option<Rate>,
    /// Tariff that breaks even at the planned volume
    pub breakeven_tariff_at_plan: Option<Money>,
    /// max(0, tariff - breakeven_tariff_at_plan)
    pub tariff_headroom: Option<Money>,
    pub tariff_headroom_pct: Option<Rate>,
    /// fixed / (fixed + variable at plan volume)
    pub fixed_share: Rate,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Annual drugs + labs cost of one patient, contingency included.
pub fn variable_cost_per_patient_y(input: &ModelInputs) -> Money {
    dec!(12)
        * (input.drugs_base * (Decimal::ONE + input.drugs_cont)
            + input.labs_base * (Decimal::ONE + input.labs_cont))
}

/// Break-even volume, margin of safety and break-even tariff.
pub fn build_breakeven(input: &ModelInputs, pnl: &IncomeStatement) -> BreakevenOutput {
    let patients = input.patients_dec();
    let var_pp_y = variable_cost_per_patient_y(input);
    let contrib_pp = (input.tariff - var_pp_y).max(Decimal::ZERO);
    let fixed_y = pnl.fixed_costs_y();

    // A contribution too small to divide by leaves break-even undefined
    let breakeven_patients = if contrib_pp > Decimal::ZERO {
        fixed_y.checked_div(contrib_pp)
    } else {
        None
    };
    let breakeven_revenue = breakeven_patients.and_then(|be| be.checked_mul(input.tariff));

    let margin_of_safety_patients = breakeven_patients.and_then(|be| patients.checked_sub(be));
    let margin_of_safety_pct = match margin_of_safety_patients {
        Some(mos) if input.patients > 0 => Some(mos / patients),
        _ => None,
    };

    let breakeven_tariff_at_plan = if input.patients > 0 {
        Some(var_pp_y + fixed_y / patients)
    } else {
        None
    };
    let tariff_headroom =
        breakeven_tariff_at_plan.map(|be_t| (input.tariff - be_t).max(Decimal::ZERO));

    BreakevenOutput {
        var_cost_per_patient_y: var_pp_y,
        contribution_per_patient: contrib_pp,
        contribution_margin_pct: safe_divide(contrib_pp, input.tariff, Decimal::ZERO),
        fixed_costs_y: fixed_y,
        breakeven_patients,
        breakeven_revenue,
        margin_of_safety_patients,
        margin_of_safety_patients_display: margin_of_safety_patients
            .map(|mos| mos.max(Decimal::ZERO)),
        margin_of_safety_pct,
        breakeven_tariff_at_plan,
        tariff_headroom,
        tariff_headroom_pct: tariff_headroom
            .map(|h| safe_divide(h, input.tariff, Decimal::ZERO)),
        fixed_share: safe_divide(fixed_y, fixed_y + var_pp_y * patients, Decimal::ZERO),
    }
}

/// Break-even analysis wrapped in the standard output envelope.
pub fn analyze_breakeven(
    input: &ModelInputs,
) -> ClinicModelResult<ComputationOutput<BreakevenOutput>> {
    let start = Instant::now();
    let pnl = build_income_statement(input);
    let output = build_breakeven(input, &pnl);
    let warnings = breakeven_warnings(input, &output);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cost-Volume-Profit Break-even (per-patient contribution)",
        &serde_json::json!({
            "patients": input.patients,
            "tariff": input.tariff.to_string(),
            "var_cost_per_patient_y": output.var_cost_per_patient_y.to_string(),
            "fixed_costs_y": output.fixed_costs_y.to_string(),
        }),
        warnings,
        elapsed,
        output,
    ))
}

/// Warnings describing every undefined figure of a break-even result.
pub fn breakeven_warnings(input: &ModelInputs, output: &BreakevenOutput) -> Vec<String> {
    let mut warnings = Vec::new();
    if output.breakeven_patients.is_none() {
        if output.contribution_per_patient > Decimal::ZERO {
            warnings.push(
                "Contribution per patient is too small to reach break-even; break-even volume is undefined"
                    .into(),
            );
        } else {
            warnings.push(
                "Contribution per patient is zero or negative; break-even volume is undefined"
                    .into(),
            );
        }
    }
    if input.patients == 0 {
        warnings.push(
            "Patient volume is zero; margin of safety and break-even tariff are undefined".into(),
        );
    }
    if let Some(mos) = output.margin_of_safety_patients {
        if mos < Decimal::ZERO {
            warnings.push(format!(
                "Planned volume is {} patients below break-even",
                (-mos).round_dp(1)
            ));
        }
    }
    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
