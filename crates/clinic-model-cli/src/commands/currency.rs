use clap::Args;
use serde_json::Value;
use std::time::Instant;

use clinic_model_core::currency::{convert, RateTable};
use clinic_model_core::{with_metadata, Currency};

use super::model::load_inputs;
use crate::input;

/// Arguments for currency conversion
#[derive(Args)]
pub struct ConvertArgs {
    /// Path to a JSON or YAML file with model inputs
    #[arg(long)]
    pub input: Option<String>,

    /// Target currency: USD, COP or EUR
    #[arg(long)]
    pub to: Currency,

    /// Path to a JSON or YAML rate table (defaults to the built-in cached rates)
    #[arg(long)]
    pub rates: Option<String>,
}

pub fn run_convert(args: ConvertArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let inputs = load_inputs(args.input.as_deref())?;
    let table: RateTable = match args.rates {
        Some(ref path) => input::file::read_document(path)?,
        None => RateTable::fallback(),
    };

    let rate = table.rate(inputs.currency, args.to)?;
    let converted = convert(&inputs, args.to, &table)?;

    let mut warnings = Vec::new();
    if inputs.currency == args.to {
        warnings.push(format!("Inputs are already in {}; nothing to convert", args.to));
    }

    let result = with_metadata(
        "Currency conversion of monetary inputs (fractions and volumes unchanged)",
        &serde_json::json!({
            "from": inputs.currency,
            "to": args.to,
            "rate": rate.to_string(),
            "rates_as_of": table.as_of,
        }),
        warnings,
        start.elapsed().as_micros() as u64,
        converted,
    );
    Ok(serde_json::to_value(result)?)
}
