use clap::Args;
use serde_json::Value;
use tracing::{debug, info};

use clinic_model_core::breakeven::cvp;
use clinic_model_core::pnl::income_statement;
use clinic_model_core::sensitivity::{grid, tornado};
use clinic_model_core::stress::scenarios;
use clinic_model_core::valuation::dcf;
use clinic_model_core::{model, validate_inputs, ModelInputs};

use crate::input;

/// Arguments shared by every model subcommand
#[derive(Args)]
pub struct ModelArgs {
    /// Path to a JSON or YAML file with model inputs (stdin is read when
    /// omitted). Missing fields take their baseline values.
    #[arg(long)]
    pub input: Option<String>,
}

/// Inputs from --input, then stdin, then the baseline scenario; always
/// range-checked before any engine runs.
pub fn load_inputs(path: Option<&str>) -> Result<ModelInputs, Box<dyn std::error::Error>> {
    let inputs: ModelInputs = if let Some(path) = path {
        debug!(path, "reading inputs from file");
        input::file::read_document(path)?
    } else if let Some(inputs) = input::stdin::read_stdin()? {
        debug!("read inputs from stdin");
        inputs
    } else {
        info!("no input supplied; using the baseline scenario");
        ModelInputs::default()
    };

    validate_inputs(&inputs)?;
    Ok(inputs)
}

pub fn run_model(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = model::run_model(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_pnl(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = income_statement::analyze_income_statement(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_breakeven(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = cvp::analyze_breakeven(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_valuation(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = dcf::calculate_valuation(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_tornado(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = tornado::analyze_tornado(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_grid(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = grid::analyze_volume_tariff_grid(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_npv_grid(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = grid::analyze_npv_grid(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_stress(args: ModelArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs = load_inputs(args.input.as_deref())?;
    let result = scenarios::analyze_stress(&inputs)?;
    Ok(serde_json::to_value(result)?)
}
