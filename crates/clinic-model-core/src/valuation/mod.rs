pub mod cash_flow;
pub mod dcf;

pub use cash_flow::{build_cash_flows, project_flows, CashFlowProjection, CashFlowYear};
pub use dcf::{build_valuation, calculate_valuation, ValuationOutput};
