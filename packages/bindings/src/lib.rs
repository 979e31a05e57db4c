use clinic_model_core::ModelInputs;
use napi::Result as NapiResult;
use napi_derive::napi;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Parse and range-check model inputs. Omitted fields take baseline values.
fn parse_inputs(input_json: &str) -> NapiResult<ModelInputs> {
    let input: ModelInputs = serde_json::from_str(input_json).map_err(to_napi_error)?;
    clinic_model_core::validate_inputs(&input).map_err(to_napi_error)?;
    Ok(input)
}

// ---------------------------------------------------------------------------
// Full model
// ---------------------------------------------------------------------------

#[napi]
pub fn compute_model(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output = clinic_model_core::run_model(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

#[napi]
pub fn income_statement(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output = clinic_model_core::pnl::income_statement::analyze_income_statement(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn breakeven(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output =
        clinic_model_core::breakeven::cvp::analyze_breakeven(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn valuation(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output =
        clinic_model_core::valuation::dcf::calculate_valuation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity & stress
// ---------------------------------------------------------------------------

#[napi]
pub fn tornado(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output =
        clinic_model_core::sensitivity::tornado::analyze_tornado(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn volume_tariff_grid(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output = clinic_model_core::sensitivity::grid::analyze_volume_tariff_grid(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn npv_grid(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output =
        clinic_model_core::sensitivity::grid::analyze_npv_grid(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn stress_scenarios(input_json: String) -> NapiResult<String> {
    let input = parse_inputs(&input_json)?;
    let output =
        clinic_model_core::stress::scenarios::analyze_stress(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

#[derive(serde::Deserialize)]
struct ConvertBindingInput {
    inputs: ModelInputs,
    to: clinic_model_core::Currency,
    #[serde(default)]
    rates: Option<clinic_model_core::currency::RateTable>,
}

#[napi]
pub fn convert_currency(input_json: String) -> NapiResult<String> {
    let binding_input: ConvertBindingInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    clinic_model_core::validate_inputs(&binding_input.inputs).map_err(to_napi_error)?;
    let rates = binding_input.rates.unwrap_or_default();
    let output =
        clinic_model_core::currency::convert(&binding_input.inputs, binding_input.to, &rates)
            .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
