use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_NODATA, RESAMPLE_OFFSET};
use crate::error::HydrologyError;

/// Rectangular grid of samples with an origin and a uniform cell size.
///
/// Values are stored row-major. A `Raster` is never mutated after
/// construction; resampling produces a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
    origin: (f64, f64),
    cell_size: f64,
    nodata: f64,
}

impl Raster {
    /// Build a raster from row-major `data`.
    ///
    /// Fails if either dimension is zero, the cell size is not a positive
    /// finite number, or `data` does not hold exactly `rows * cols` values.
    pub fn new(
        rows: usize,
        cols: usize,
        data: Vec<f64>,
        origin: (f64, f64),
        cell_size: f64,
    ) -> Result<Self, HydrologyError> {
        if rows == 0 || cols == 0 {
            return Err(HydrologyError::InvalidRaster(format!(
                "dimensions must be at least 1x1, got {rows}x{cols}"
            )));
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(HydrologyError::InvalidRaster(format!(
                "cell size must be positive, got {cell_size}"
            )));
        }
        if data.len() != rows * cols {
            return Err(HydrologyError::InvalidRaster(format!(
                "expected {} values for {rows}x{cols}, got {}",
                rows * cols,
                data.len()
            )));
        }
        Ok(Self {
            data,
            rows,
            cols,
            origin,
            cell_size,
            nodata: DEFAULT_NODATA,
        })
    }

    /// Build a raster from nested rows. Ragged input is rejected.
    pub fn from_rows(
        rows: Vec<Vec<f64>>,
        origin: (f64, f64),
        cell_size: f64,
    ) -> Result<Self, HydrologyError> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        if let Some((r, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != ncols) {
            return Err(HydrologyError::InvalidRaster(format!(
                "row {r} has {} values, expected {ncols}",
                row.len()
            )));
        }
        let data = rows.into_iter().flatten().collect();
        Self::new(nrows, ncols, data, origin, cell_size)
    }

    /// A raster with every cell set to `value`, for callers that fill it later.
    pub fn filled(
        rows: usize,
        cols: usize,
        value: f64,
        origin: (f64, f64),
        cell_size: f64,
    ) -> Result<Self, HydrologyError> {
        Self::new(rows, cols, vec![value; rows * cols], origin, cell_size)
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = nodata;
        self
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// `(x, y)` of the lower-left corner.
    #[inline]
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    #[inline]
    pub fn nodata(&self) -> f64 {
        self.nodata
    }

    #[inline]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    #[inline]
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[self.index(row, col)]
    }

    /// One row of samples.
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Smallest and largest sample.
    pub fn min_max(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Coarsen the raster so each cell is `factor` times larger.
    ///
    /// A factor of 1 returns an identical copy.
    pub fn create_with_increased_cellsize(&self, factor: usize) -> Result<Self, HydrologyError> {
        match factor {
            0 => Err(HydrologyError::InvalidResampleFactor(factor)),
            1 => Ok(self.clone()),
            _ => self.resample(factor),
        }
    }

    /// Area-average `factor x factor` blocks into one output cell.
    ///
    /// Output dimensions use floor division: trailing rows and columns that
    /// do not fill a whole block are dropped. Every output value carries
    /// `RESAMPLE_OFFSET`.
    pub fn resample(&self, factor: usize) -> Result<Self, HydrologyError> {
        if factor == 0 {
            return Err(HydrologyError::InvalidResampleFactor(factor));
        }
        let nrows = self.rows / factor;
        let ncols = self.cols / factor;
        let block = (factor * factor) as f64;

        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                let mut sum = 0.0;
                for k in 0..factor {
                    for l in 0..factor {
                        sum += self.get(i * factor + k, j * factor + l);
                    }
                }
                data.push(sum / block + RESAMPLE_OFFSET);
            }
        }

        Ok(Self::new(nrows, ncols, data, self.origin, self.cell_size * factor as f64)?
            .with_nodata(self.nodata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(rows: usize, cols: usize) -> Raster {
        let data = (0..rows * cols).map(|v| v as f64).collect();
        Raster::new(rows, cols, data, (0.0, 0.0), 1.0).unwrap()
    }

    #[test]
    fn test_new_rejects_empty() {
        let err = Raster::new(0, 3, vec![], (0.0, 0.0), 1.0).unwrap_err();
        assert!(matches!(err, HydrologyError::InvalidRaster(_)));
    }

    #[test]
    fn test_new_rejects_bad_cell_size() {
        assert!(Raster::new(1, 1, vec![0.0], (0.0, 0.0), 0.0).is_err());
        assert!(Raster::new(1, 1, vec![0.0], (0.0, 0.0), -2.0).is_err());
        assert!(Raster::new(1, 1, vec![0.0], (0.0, 0.0), f64::NAN).is_err());
    }

    #[test]
    fn test_new_rejects_wrong_length() {
        assert!(Raster::new(2, 2, vec![1.0; 3], (0.0, 0.0), 1.0).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let rows = vec![vec![1.0, 2.0], vec![3.0]];
        assert!(Raster::from_rows(rows, (0.0, 0.0), 1.0).is_err());
    }

    #[test]
    fn test_from_rows_row_major() {
        let r = Raster::from_rows(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]], (2.0, 3.0), 5.0)
            .unwrap();
        assert_eq!(r.shape(), (2, 3));
        assert_eq!(r.get(1, 0), 4.0);
        assert_eq!(r.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(r.origin(), (2.0, 3.0));
        assert_eq!(r.cell_size(), 5.0);
        assert_eq!(r.nodata(), DEFAULT_NODATA);
    }

    #[test]
    fn test_filled() {
        let r = Raster::filled(3, 4, 7.5, (0.0, 0.0), 1.0).unwrap();
        assert!(r.data().iter().all(|&v| v == 7.5));
        assert_eq!(r.min_max(), (7.5, 7.5));
    }

    #[test]
    fn test_in_bounds() {
        let r = ramp(3, 4);
        assert!(r.in_bounds(2, 3));
        assert!(!r.in_bounds(3, 0));
        assert!(!r.in_bounds(0, 4));
    }

    #[test]
    fn test_factor_one_is_bit_identical() {
        let data = vec![0.1, -3.25, 1e-12, 42.0, f64::MIN_POSITIVE, 7.0];
        let r = Raster::new(2, 3, data, (1.5, -2.0), 0.25).unwrap().with_nodata(-1.0);
        let same = r.create_with_increased_cellsize(1).unwrap();
        assert_eq!(same.shape(), r.shape());
        assert_eq!(same.origin(), r.origin());
        assert_eq!(same.cell_size().to_bits(), r.cell_size().to_bits());
        assert_eq!(same.nodata().to_bits(), r.nodata().to_bits());
        for (a, b) in same.data().iter().zip(r.data()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_factor_zero_rejected() {
        let r = ramp(2, 2);
        assert!(matches!(
            r.create_with_increased_cellsize(0),
            Err(HydrologyError::InvalidResampleFactor(0))
        ));
    }

    #[test]
    fn test_resample_averages_blocks_with_offset() {
        // 4x4 ramp: block (0,0) holds 0,1,4,5 -> mean 2.5
        let r = ramp(4, 4);
        let coarse = r.create_with_increased_cellsize(2).unwrap();
        assert_eq!(coarse.shape(), (2, 2));
        assert_eq!(coarse.cell_size(), 2.0);
        assert!((coarse.get(0, 0) - (2.5 + RESAMPLE_OFFSET)).abs() < 1e-12);
        assert!((coarse.get(1, 1) - (12.5 + RESAMPLE_OFFSET)).abs() < 1e-12);
    }

    #[test]
    fn test_resample_drops_remainder() {
        let r = ramp(5, 7);
        let coarse = r.resample(2).unwrap();
        assert_eq!(coarse.shape(), (2, 3));
    }

    #[test]
    fn test_resample_factor_larger_than_grid() {
        let r = ramp(3, 3);
        assert!(matches!(
            r.resample(4),
            Err(HydrologyError::InvalidRaster(_))
        ));
    }
}
