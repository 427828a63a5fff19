/// Default generated grid size (cells per side).
pub const DEFAULT_ROWS: usize = 40;
pub const DEFAULT_COLS: usize = 40;
pub const DEFAULT_CELL_SIZE: f64 = 1.0;

/// No-data sentinel written by the grid-exchange format when a file omits one.
pub const DEFAULT_NODATA: f64 = -999.999;

/// Constant added to every averaged cell by `Raster::resample`. Coarsened
/// grids sit this far above the source datum.
pub const RESAMPLE_OFFSET: f64 = 100.0;

/// Number of noise octaves blended by the random terrain generator.
pub const DEFAULT_LEVELS: usize = 4;
pub const DEFAULT_ELEVATION_LOW: f64 = 0.0;
pub const DEFAULT_ELEVATION_HIGH: f64 = 100.0;
/// Focus of the radial slope (grid column, grid row). Terrain rises toward it.
pub const DEFAULT_ELEVATION_FOCUS: (f64, f64) = (5.0, 5.0);
/// Share of the random component in the slope/noise blend.
pub const DEFAULT_RANDOM_FRACTION: f64 = 0.1;

/// Rainfall field range in millimetres.
pub const DEFAULT_RAIN_LOW: f64 = 1.0;
pub const DEFAULT_RAIN_HIGH: f64 = 4000.0;
pub const DEFAULT_RAIN_FOCUS: (f64, f64) = (36.0, 4.0);

pub const DEFAULT_RESAMPLE_FACTOR: usize = 1;
pub const DEFAULT_SEED: u64 = 42;

/// Relative tolerance when comparing total rainfall against total outflow.
pub const MASS_BALANCE_TOLERANCE: f64 = 1e-9;
