pub mod grid;
pub mod tornado;

pub use grid::{
    build_npv_grid, build_volume_tariff_grid, NpvGrid, NpvGridSummary, VolumeTariffGrid,
};
pub use tornado::{build_tornado, TornadoBar, TornadoDriver};
