//! Qualitative reading of the model's numbers. Bands are plain enums; turning
//! them into prose or colours is left to the presentation layer.

pub mod bands;
pub mod summary;

pub use bands::*;
pub use summary::{interpret, recommendation, strategic_position, Interpretation, Recommendation, StrategicPosition};
