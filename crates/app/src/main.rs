//! `lakeflow`: resolve drainage for one terrain and report the result.
//!
//! Runs `DrainagePlugin` once inside a headless app. Environment variables:
//!   - `LAKEFLOW_DEM`: grid-exchange file to use as elevation instead of
//!     generated terrain
//!   - `LAKEFLOW_RAIN`: grid-exchange rainfall file (needs `LAKEFLOW_DEM`)
//!   - `LAKEFLOW_REPORT`: write the summary as pretty JSON to this path

use std::process::ExitCode;

use bevy::log::LogPlugin;
use bevy::prelude::*;

use hydrology::ascii_grid::read_ascii_grid;
use hydrology::{DrainageFailure, DrainagePlugin, DrainageSummary, HydrologyError, TerrainInputs};

/// Inputs named by the environment, if any.
fn load_inputs() -> Result<Option<TerrainInputs>, HydrologyError> {
    let Ok(dem_path) = std::env::var("LAKEFLOW_DEM") else {
        if std::env::var("LAKEFLOW_RAIN").is_ok() {
            warn!("LAKEFLOW_RAIN is ignored without LAKEFLOW_DEM");
        }
        return Ok(None);
    };
    let elevation = read_ascii_grid(&dem_path)?;
    info!(
        "Loaded elevation {}x{} from {dem_path}",
        elevation.rows(),
        elevation.cols()
    );
    let rainfall = match std::env::var("LAKEFLOW_RAIN") {
        Ok(rain_path) => Some(read_ascii_grid(&rain_path)?),
        Err(_) => None,
    };
    Ok(Some(TerrainInputs {
        elevation,
        rainfall,
    }))
}

fn write_report(path: &str, summary: &DrainageSummary) -> Result<(), HydrologyError> {
    let json = serde_json::to_string_pretty(summary).map_err(std::io::Error::from)?;
    std::fs::write(path, json)?;
    Ok(())
}

fn main() -> ExitCode {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()));

    match load_inputs() {
        Ok(Some(inputs)) => {
            app.insert_resource(inputs);
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to load input grids: {e}");
            return ExitCode::FAILURE;
        }
    }

    app.add_plugins(DrainagePlugin);
    app.update();

    if let Some(failure) = app.world().get_resource::<DrainageFailure>() {
        error!("Drainage failed: {}", failure.0);
        return ExitCode::FAILURE;
    }
    let Some(summary) = app.world().get_resource::<DrainageSummary>() else {
        error!("Drainage produced no summary");
        return ExitCode::FAILURE;
    };

    info!(
        "{}x{} grid: {} pits, {} lakes over {} cells (deepest {:.3})",
        summary.rows,
        summary.cols,
        summary.pits_before_lakes,
        summary.lakes,
        summary.lake_cells,
        summary.max_lake_depth
    );
    info!(
        "Max flow {:.3} at {:?}; rain {:.3}, outflow {:.3}, balanced: {}",
        summary.max_flow,
        summary.max_flow_cell,
        summary.total_rainfall,
        summary.total_flow,
        summary.mass_balanced
    );

    if let Ok(path) = std::env::var("LAKEFLOW_REPORT") {
        if let Err(e) = write_report(&path, summary) {
            error!("Failed to write report to {path}: {e}");
            return ExitCode::FAILURE;
        }
        info!("Wrote summary to {path}");
    }

    if summary.mass_balanced {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
