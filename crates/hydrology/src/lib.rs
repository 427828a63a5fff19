//! Surface-water routing and lake resolution over elevation rasters.
//!
//! Load or generate a `Raster`, wrap it in a `DrainageGraph`, add rainfall and
//! call `calculate_lakes`; afterwards every cell drains to a boundary pit and
//! flow, lake depth and rainfall can be read back per cell through the
//! `Extractor` implementations. `DrainagePlugin` runs the same steps inside a
//! headless Bevy app.

pub mod ascii_grid;
pub mod config;
pub mod error;
pub mod flow;
pub mod pipeline;
pub mod raster;
pub mod terrain;

pub use error::HydrologyError;
pub use flow::{
    DrainageGraph, ElevationExtractor, Extractor, FlowExtractor, FlowNode, Lake,
    LakeDepthExtractor, RainfallExtractor,
};
pub use pipeline::{DrainageConfig, DrainageFailure, DrainagePlugin, DrainageSummary, TerrainInputs};
pub use raster::Raster;
