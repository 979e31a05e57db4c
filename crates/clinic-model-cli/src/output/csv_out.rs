use serde_json::{Map, Value};
use std::io;

use super::{find_grid, Grid};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// A top-level grid is written as a matrix, an array of records as one row
/// per record, and anything else as `field,value` pairs with dotted paths.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result {
        Value::Object(map) => {
            if let Some(grid) = find_grid(map) {
                write_grid_csv(&mut wtr, &grid);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                write_flat_csv(&mut wtr, "", map);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_csv_value(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_flat_csv(wtr: &mut StdoutWriter<'_>, prefix: &str, map: &Map<String, Value>) {
    for (key, val) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match val {
            Value::Object(child) => write_flat_csv(wtr, &path, child),
            Value::Array(items) if items.iter().any(|v| v.is_object() || v.is_array()) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}.{}", path, i);
                    match item {
                        Value::Object(child) => write_flat_csv(wtr, &item_path, child),
                        Value::Array(row) => {
                            for (j, cell) in row.iter().enumerate() {
                                let cell_path = format!("{}.{}", item_path, j);
                                let _ = wtr.write_record([cell_path.as_str(), &format_csv_value(cell)]);
                            }
                        }
                        _ => {
                            let _ = wtr.write_record([item_path.as_str(), &format_csv_value(item)]);
                        }
                    }
                }
            }
            _ => {
                let _ = wtr.write_record([path.as_str(), &format_csv_value(val)]);
            }
        }
    }
}

fn write_grid_csv(wtr: &mut StdoutWriter<'_>, grid: &Grid<'_>) {
    let mut header = vec![format!("{}\\{}", grid.row_axis, grid.col_axis)];
    header.extend(grid.cols.iter().map(format_csv_value));
    let _ = wtr.write_record(&header);

    for (label, row) in grid.rows.iter().zip(grid.cells) {
        let mut record = vec![format_csv_value(label)];
        if let Value::Array(cells) = row {
            record.extend(cells.iter().map(format_csv_value));
        }
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(format_csv_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_csv_value(item)]);
        }
    }
}

fn format_csv_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_csv_value).collect::<Vec<_>>().join(";"),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}
