use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{find_grid, Grid};

/// Format output as tables using the tabled crate.
///
/// Scalars land in a Field/Value table. Statement lines (objects whose
/// members share one shape) become a matrix, two-way grids are laid out
/// with their axes, and anything else nested gets its own titled section.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section("", result);
                print_footer(map);
            } else {
                print_section("", value);
            }
        }
        _ => print_section("", value),
    }
}

fn print_footer(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_section(path: &str, value: &Value) {
    if !path.is_empty() {
        println!("\n[{}]", path);
    }

    match value {
        Value::Object(map) => print_object(path, map),
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", format_value(value)),
    }
}

fn print_object(path: &str, map: &Map<String, Value>) {
    let mut rest = map.clone();
    if let Some(grid) = find_grid(map) {
        print_grid(&grid);
        for key in [grid.name, grid.row_axis, grid.col_axis] {
            rest.remove(key);
        }
    }

    if is_line_table(&rest) {
        print_line_table(&rest);
        return;
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut nested: Vec<(&String, &Value)> = Vec::new();
    let mut has_scalars = false;

    for (key, val) in &rest {
        if is_nested(val) {
            nested.push((key, val));
        } else {
            builder.push_record([key.as_str(), &format_value(val)]);
            has_scalars = true;
        }
    }

    if has_scalars {
        println!("{}", Table::from(builder));
    }

    for (key, val) in nested {
        let child = if path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", path, key)
        };
        print_section(&child, val);
    }
}

fn print_grid(grid: &Grid<'_>) {
    let mut builder = Builder::default();
    let mut header = vec![format!("{} \\ {}", grid.row_axis, grid.col_axis)];
    header.extend(grid.cols.iter().map(format_value));
    builder.push_record(header);

    for (label, row) in grid.rows.iter().zip(grid.cells) {
        let mut record = vec![format_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_value));
        }
        builder.push_record(record);
    }

    println!("{} grid", grid.name);
    println!("{}", Table::from(builder));
}

/// Every member is an object of scalars with the same keys as the first.
fn is_line_table(map: &Map<String, Value>) -> bool {
    let first = match map.values().next() {
        Some(Value::Object(first)) => first,
        _ => return false,
    };
    let shape: Vec<&String> = first.keys().collect();

    map.values().all(|v| match v {
        Value::Object(m) => m.keys().eq(shape.iter().copied()) && m.values().all(|x| !is_nested(x)),
        _ => false,
    })
}

fn print_line_table(map: &Map<String, Value>) {
    let columns: Vec<String> = match map.values().next() {
        Some(Value::Object(first)) => first.keys().cloned().collect(),
        _ => return,
    };

    let mut builder = Builder::default();
    let mut header = vec![String::from("line")];
    header.extend(columns.iter().cloned());
    builder.push_record(header);

    for (name, line) in map {
        let mut record = vec![name.clone()];
        record.extend(
            columns
                .iter()
                .map(|c| line.get(c).map(format_value).unwrap_or_default()),
        );
        builder.push_record(record);
    }

    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        println!("{}", format_value(&Value::Array(arr.to_vec())));
    }
}

fn is_nested(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(arr) => arr.iter().any(|v| v.is_object() || v.is_array()),
        _ => false,
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
