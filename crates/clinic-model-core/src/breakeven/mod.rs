pub mod cvp;
pub mod frontier;

pub use cvp::{build_breakeven, variable_cost_per_patient_y, BreakevenOutput};
pub use frontier::{breakeven_frontier, breakeven_tariff, FrontierPoint};
