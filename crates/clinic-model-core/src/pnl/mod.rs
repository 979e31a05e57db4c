pub mod income_statement;
pub mod kpi;

pub use income_statement::{build_income_statement, IncomeStatement, PnlLine};
pub use kpi::{compute_key_metrics, KeyMetrics};
