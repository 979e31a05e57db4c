pub mod conversion;

pub use conversion::{convert, RateTable};
