pub mod currency;
pub mod model;
