//! Random terrain generation for demonstration and testing.
//!
//! Elevations are a blend of multi-scale smoothed noise and a radial slope
//! rising toward a focus point, normalised into a requested range. All
//! randomness comes from a caller-supplied RNG so a seed reproduces the same
//! grid on every platform.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_CELL_SIZE, DEFAULT_COLS, DEFAULT_ELEVATION_HIGH, DEFAULT_ELEVATION_LOW,
    DEFAULT_LEVELS, DEFAULT_RANDOM_FRACTION, DEFAULT_ROWS,
};
use crate::error::HydrologyError;
use crate::raster::Raster;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainParams {
    pub rows: usize,
    pub cols: usize,
    pub cell_size: f64,
    pub origin: (f64, f64),
    /// Number of noise octaves; clamped to the smaller grid dimension.
    pub levels: usize,
    pub low: f64,
    pub high: f64,
    /// Slope focus as (column, row). `None` means the grid centre.
    pub focus: Option<(f64, f64)>,
    /// Weight of the noise component in `[0, 1]`; the slope gets the rest.
    pub random_fraction: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cell_size: DEFAULT_CELL_SIZE,
            origin: (0.0, 0.0),
            levels: DEFAULT_LEVELS,
            low: DEFAULT_ELEVATION_LOW,
            high: DEFAULT_ELEVATION_HIGH,
            focus: None,
            random_fraction: DEFAULT_RANDOM_FRACTION,
        }
    }
}

/// Deterministic generator for a seed.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Linearly rescale `values` into `[low, high]`. A constant field maps to `low`.
fn normalise(values: &mut [f64], low: f64, high: f64) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !(range > 0.0) {
        values.iter_mut().for_each(|v| *v = low);
        return;
    }
    let span = high - low;
    for v in values.iter_mut() {
        *v = (*v - min) / range * span + low;
    }
}

/// Wrapping box sum over `radius` rows above and below each cell.
fn smooth_rows(part: &[f64], rows: usize, cols: usize, radius: usize) -> Vec<f64> {
    let mut out = vec![0.0; rows * cols];
    let r = radius as isize;
    for j in 0..rows {
        for k in 0..cols {
            let mut sum = 0.0;
            for dr in -r..=r {
                let src = (j as isize + dr).rem_euclid(rows as isize) as usize;
                sum += part[src * cols + k];
            }
            out[j * cols + k] = sum;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Multi-scale noise raster in `[params.low, params.high]`.
///
/// Octave `i` is uniform noise smoothed over `2i + 1` rows and weighted by
/// `2^i`, so coarse structure dominates fine detail.
pub fn random_raster(params: &TerrainParams, rng: &mut impl Rng) -> Result<Raster, HydrologyError> {
    let (rows, cols) = (params.rows, params.cols);
    let levels = params.levels.min(rows).min(cols);
    let span = params.high - params.low;

    let noise: Vec<Vec<f64>> = (0..levels)
        .map(|_| {
            (0..rows * cols)
                .map(|_| params.low + rng.gen::<f64>() * span)
                .collect()
        })
        .collect();

    let mut out = vec![0.0; rows * cols];
    for (i, part) in noise.iter().enumerate() {
        let mut level = smooth_rows(part, rows, cols, i);
        normalise(&mut level, 0.0, 2f64.powi(i as i32));
        for (o, v) in out.iter_mut().zip(&level) {
            *o += v;
        }
    }
    normalise(&mut out, params.low, params.high);

    Raster::new(rows, cols, out, params.origin, params.cell_size)
}

/// Noise blended with a radial slope that peaks at the focus point.
pub fn random_slope_raster(
    params: &TerrainParams,
    rng: &mut impl Rng,
) -> Result<Raster, HydrologyError> {
    let (rows, cols) = (params.rows, params.cols);
    let (focus_x, focus_y) = params
        .focus
        .unwrap_or((cols as f64 / 2.0, rows as f64 / 2.0));

    let unit = TerrainParams {
        low: 0.0,
        high: 1.0,
        ..params.clone()
    };
    let noise = random_raster(&unit, rng)?;

    let max_dist = ((rows * rows + cols * cols) as f64).sqrt();
    let mut slope = Vec::with_capacity(rows * cols);
    for i in 0..rows {
        for j in 0..cols {
            let xd = focus_x - j as f64;
            let yd = focus_y - i as f64;
            slope.push((max_dist - (xd * xd + yd * yd).sqrt()) / max_dist);
        }
    }
    normalise(&mut slope, 0.0, 1.0);

    let w = params.random_fraction;
    let mut out: Vec<f64> = slope
        .iter()
        .zip(noise.data())
        .map(|(s, n)| s * (1.0 - w) + n * w)
        .collect();
    normalise(&mut out, params.low, params.high);

    Raster::new(rows, cols, out, params.origin, params.cell_size)
}
