pub mod error;
pub mod inputs;
pub mod time_value;
pub mod types;

pub mod breakeven;
pub mod model;
pub mod pnl;
pub mod sensitivity;
pub mod stress;
pub mod valuation;

#[cfg(feature = "currency")]
pub mod currency;

#[cfg(feature = "interpretation")]
pub mod interpretation;

pub use error::ClinicModelError;
pub use inputs::{validate_inputs, ModelInputs};
pub use model::{compute, run_model, ModelOutputs};
pub use types::*;

/// Standard result type for all clinic model computations
pub type ClinicModelResult<T> = Result<T, ClinicModelError>;
