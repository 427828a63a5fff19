//! Headless drainage pipeline.
//!
//! `DrainagePlugin` runs once at startup: it generates (or takes) the input
//! rasters, coarsens the elevation grid, routes water, resolves lakes and
//! publishes the resulting `DrainageGraph` together with a `DrainageSummary`.
//! Failures are logged and recorded in `DrainageFailure` instead of panicking.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_CELL_SIZE, DEFAULT_COLS, DEFAULT_ELEVATION_FOCUS, DEFAULT_ELEVATION_HIGH,
    DEFAULT_ELEVATION_LOW, DEFAULT_LEVELS, DEFAULT_RAIN_FOCUS, DEFAULT_RAIN_HIGH,
    DEFAULT_RAIN_LOW, DEFAULT_RANDOM_FRACTION, DEFAULT_RESAMPLE_FACTOR, DEFAULT_ROWS,
    DEFAULT_SEED, MASS_BALANCE_TOLERANCE,
};
use crate::error::HydrologyError;
use crate::flow::DrainageGraph;
use crate::raster::Raster;
use crate::terrain::{random_slope_raster, seeded_rng, TerrainParams};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Parameters for generated inputs and drainage resolution.
#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
pub struct DrainageConfig {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
    pub origin: (f64, f64),
    pub levels: usize,
    pub elevation_low: f64,
    pub elevation_high: f64,
    /// Slope focus (column, row) of the elevation field.
    pub elevation_focus: Option<(f64, f64)>,
    pub rain_low: f64,
    pub rain_high: f64,
    /// Slope focus (column, row) of the rainfall field, in coarsened cells.
    pub rain_focus: Option<(f64, f64)>,
    pub random_fraction: f64,
    /// Elevation is coarsened by this factor before routing.
    pub resample_factor: usize,
    pub seed: u64,
}

impl Default for DrainageConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cell_size: DEFAULT_CELL_SIZE,
            origin: (0.0, 0.0),
            levels: DEFAULT_LEVELS,
            elevation_low: DEFAULT_ELEVATION_LOW,
            elevation_high: DEFAULT_ELEVATION_HIGH,
            elevation_focus: Some(DEFAULT_ELEVATION_FOCUS),
            rain_low: DEFAULT_RAIN_LOW,
            rain_high: DEFAULT_RAIN_HIGH,
            rain_focus: Some(DEFAULT_RAIN_FOCUS),
            random_fraction: DEFAULT_RANDOM_FRACTION,
            resample_factor: DEFAULT_RESAMPLE_FACTOR,
            seed: DEFAULT_SEED,
        }
    }
}

impl DrainageConfig {
    pub fn elevation_params(&self) -> TerrainParams {
        TerrainParams {
            rows: self.rows,
            cols: self.cols,
            cell_size: self.cell_size,
            origin: self.origin,
            levels: self.levels,
            low: self.elevation_low,
            high: self.elevation_high,
            focus: self.elevation_focus,
            random_fraction: self.random_fraction,
        }
    }

    /// Rainfall is generated directly on the coarsened grid.
    pub fn rainfall_params(&self) -> TerrainParams {
        let factor = self.resample_factor.max(1);
        TerrainParams {
            rows: self.rows / factor,
            cols: self.cols / factor,
            cell_size: self.cell_size * factor as f64,
            origin: self.origin,
            levels: self.levels,
            low: self.rain_low,
            high: self.rain_high,
            focus: self.rain_focus,
            random_fraction: self.random_fraction,
        }
    }
}

/// Input rasters. Insert before the first update to skip generation.
#[derive(Resource, Debug, Clone)]
pub struct TerrainInputs {
    pub elevation: Raster,
    /// Must match the coarsened elevation shape.
    pub rainfall: Option<Raster>,
}

/// Aggregate results of one drainage resolution.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrainageSummary {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
    pub pits_before_lakes: usize,
    pub boundary_pits: usize,
    pub lakes: usize,
    pub lake_cells: usize,
    pub max_lake_depth: f64,
    pub max_flow: f64,
    /// (row, col) of the first cell carrying `max_flow`.
    pub max_flow_cell: (usize, usize),
    pub max_flow_position: (f64, f64),
    pub total_rainfall: f64,
    pub total_flow: f64,
    pub mass_balanced: bool,
}

impl DrainageSummary {
    pub fn from_graph(graph: &DrainageGraph, pits_before_lakes: usize) -> Self {
        let (max_flow, at) = graph.maximum_flow();
        let node = graph.node_at(at);
        let total_rainfall = graph.total_rainfall();
        let total_flow = graph.total_flow();
        Self {
            rows: graph.rows(),
            cols: graph.cols(),
            cell_size: graph.cell_size(),
            pits_before_lakes,
            boundary_pits: graph.boundary_pits().len(),
            lakes: graph.lakes().len(),
            lake_cells: graph.lake_cells(),
            max_lake_depth: graph.max_lake_depth(),
            max_flow,
            max_flow_cell: (node.row(), node.col()),
            max_flow_position: node.position(),
            total_rainfall,
            total_flow,
            mass_balanced: (total_rainfall - total_flow).abs()
                <= MASS_BALANCE_TOLERANCE * total_rainfall.abs().max(1.0),
        }
    }
}

/// Why the pipeline stopped.
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct DrainageFailure(pub String);

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Generate the elevation and rainfall rasters for `config`.
///
/// Rainfall draws from its own stream (`seed + 1`) so changing the rain
/// parameters never perturbs the terrain.
pub fn generate_inputs(config: &DrainageConfig) -> Result<TerrainInputs, HydrologyError> {
    let elevation = random_slope_raster(&config.elevation_params(), &mut seeded_rng(config.seed))?;
    let rainfall = random_slope_raster(
        &config.rainfall_params(),
        &mut seeded_rng(config.seed.wrapping_add(1)),
    )?;
    Ok(TerrainInputs {
        elevation,
        rainfall: Some(rainfall),
    })
}

/// Coarsen, route, rain and resolve lakes.
pub fn build_drainage(
    config: &DrainageConfig,
    inputs: &TerrainInputs,
) -> Result<(DrainageGraph, DrainageSummary), HydrologyError> {
    let dem = inputs
        .elevation
        .create_with_increased_cellsize(config.resample_factor)?;
    let mut graph = DrainageGraph::new(&dem);
    let pits_before_lakes = graph.pits().len();
    if let Some(rain) = &inputs.rainfall {
        graph.add_rainfall(rain)?;
    }
    graph.calculate_lakes()?;
    let summary = DrainageSummary::from_graph(&graph, pits_before_lakes);
    Ok((graph, summary))
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

pub fn generate_terrain_inputs(
    mut commands: Commands,
    config: Res<DrainageConfig>,
    existing: Option<Res<TerrainInputs>>,
) {
    if existing.is_some() {
        debug!("Using caller-supplied terrain inputs");
        return;
    }
    match generate_inputs(&config) {
        Ok(inputs) => {
            info!(
                "Generated {}x{} terrain (seed {})",
                config.rows, config.cols, config.seed
            );
            commands.insert_resource(inputs);
        }
        Err(e) => {
            error!("Terrain generation failed: {e}");
            commands.insert_resource(DrainageFailure(e.to_string()));
        }
    }
}

pub fn resolve_drainage(
    mut commands: Commands,
    config: Res<DrainageConfig>,
    inputs: Option<Res<TerrainInputs>>,
) {
    let Some(inputs) = inputs else {
        return;
    };
    match build_drainage(&config, &inputs) {
        Ok((graph, summary)) => {
            info!(
                "Drainage resolved: {} lakes, max flow {:.3} at {:?}, rain {:.3} / outflow {:.3}",
                summary.lakes,
                summary.max_flow,
                summary.max_flow_cell,
                summary.total_rainfall,
                summary.total_flow
            );
            if !summary.mass_balanced {
                warn!(
                    "Outflow {} does not match rainfall {}",
                    summary.total_flow, summary.total_rainfall
                );
            }
            commands.insert_resource(graph);
            commands.insert_resource(summary);
        }
        Err(e) => {
            error!("Drainage resolution failed: {e}");
            commands.insert_resource(DrainageFailure(e.to_string()));
        }
    }
}

// ---------------------------------------------------------------------------
// Plugin
// ---------------------------------------------------------------------------

pub struct DrainagePlugin;

impl Plugin for DrainagePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DrainageConfig>().add_systems(
            Startup,
            (generate_terrain_inputs, resolve_drainage).chain(),
        );
    }
}
