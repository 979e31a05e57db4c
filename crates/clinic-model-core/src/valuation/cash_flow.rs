use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::inputs::ModelInputs;
use crate::time_value::cumulative;
use crate::types::{Money, Rate};

/// Explicit forecast horizon after the investment year.
pub const FORECAST_YEARS: usize = 5;

/// One year of the free-cash-flow projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: u32,
    pub label: String,
    pub cash_flow: Money,
    pub cumulative: Money,
}

/// Year 0 investment followed by five years of free cash flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub years: Vec<CashFlowYear>,
}

impl CashFlowProjection {
    /// Raw flows, index = year.
    pub fn flows(&self) -> Vec<Money> {
        self.years.iter().map(|y| y.cash_flow).collect()
    }
}

/// `[cf0, cf1, cf1*(1+g), …]`, six flows in total.
pub fn project_flows(cf0: Money, cf1: Money, growth: Rate) -> Vec<Money> {
    let mut flows = Vec::with_capacity(FORECAST_YEARS + 1);
    flows.push(cf0);
    flows.push(cf1);
    for _ in 2..=FORECAST_YEARS {
        let prev = flows[flows.len() - 1];
        flows.push(prev * (Decimal::ONE + growth));
    }
    flows
}

/// Year 0 is the initial investment, year 1 is net profit times the FCF
/// conversion factor, later years grow at `rev_growth`.
pub fn build_cash_flows(input: &ModelInputs, net_profit_y: Money) -> CashFlowProjection {
    let flows = project_flows(
        -input.initial_investment,
        net_profit_y * input.fcf_factor,
        input.rev_growth,
    );
    let running = cumulative(&flows);

    let years = flows
        .iter()
        .zip(running)
        .enumerate()
        .map(|(t, (cf, cum))| CashFlowYear {
            year: t as u32,
            label: if t == 0 {
                "Year 0 (Initial)".to_string()
            } else {
                format!("Year {t}")
            },
            cash_flow: *cf,
            cumulative: cum,
        })
        .collect();

    CashFlowProjection { years }
}
