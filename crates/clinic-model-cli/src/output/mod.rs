pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Matrix fields and the axes that label their rows and columns.
pub(crate) const GRID_LAYOUTS: [(&str, &str, &str); 2] = [
    ("ebitda", "tariffs", "patients"),
    ("npv", "discount_rates", "growth_rates"),
];

/// A two-way grid found inside an output object.
pub(crate) struct Grid<'a> {
    pub name: &'a str,
    pub row_axis: &'a str,
    pub col_axis: &'a str,
    pub rows: &'a [Value],
    pub cols: &'a [Value],
    pub cells: &'a [Value],
}

pub(crate) fn find_grid(map: &Map<String, Value>) -> Option<Grid<'_>> {
    GRID_LAYOUTS.iter().find_map(|(name, row_axis, col_axis)| {
        match (map.get(*name), map.get(*row_axis), map.get(*col_axis)) {
            (Some(Value::Array(cells)), Some(Value::Array(rows)), Some(Value::Array(cols)))
                if cells.iter().all(Value::is_array) =>
            {
                Some(Grid {
                    name,
                    row_axis,
                    col_axis,
                    rows,
                    cols,
                    cells,
                })
            }
            _ => None,
        }
    })
}

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}
