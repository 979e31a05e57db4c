use rust_decimal::Decimal;
use serde_json::Value;

/// Headline figure of each command, as dotted paths into the result.
/// The first non-null hit wins.
const PRIORITY_PATHS: [&str; 9] = [
    "valuation.npv",
    "npv",
    "breakeven_patients",
    "ebitda.annual",
    "summary.worst_ebitda",
    "summary.model_cell_npv",
    "profitable_share",
    "tariff",
    "label",
];

/// Print just the key answer value from the output.
///
/// Arrays (the tornado) answer with their first element, which is the
/// biggest driver once sorted.
pub fn print_minimal(value: &Value) {
    let mut result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Array(arr) = result {
        match arr.first() {
            Some(first) => result = first,
            None => {
                println!("(empty)");
                return;
            }
        }
    }

    if let Value::Object(map) = result {
        for path in &PRIORITY_PATHS {
            if let Some(val) = lookup(result, path) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result));
}

fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |node, key| node.get(key))
}

/// Decimal strings are trimmed to 4 dp; other text passes through.
fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => match s.parse::<Decimal>() {
            Ok(d) => d.round_dp(4).normalize().to_string(),
            Err(_) => s.clone(),
        },
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
