// ---------------------------------------------------------------------------
// HydrologyError: typed failures for raster, drainage and lake operations
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors raised by raster construction, grid parsing and drainage resolution.
///
/// Precondition violations (shape mismatches, filling below the surface,
/// seeding a lake from a non-pit) and post-resolution invariant failures are
/// all reported here so callers can propagate them with `?`.
#[derive(Debug)]
pub enum HydrologyError {
    /// Raster dimensions, cell size or data length are not usable.
    InvalidRaster(String),
    /// Resampling factor must be at least 1.
    InvalidResampleFactor(usize),
    /// An input grid does not match the drainage graph shape.
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// `fill` was asked to lower a node.
    FillBelowSurface { elevation: f64, requested: f64 },
    /// A lake was seeded from a node that already drains somewhere.
    NotAPit { row: usize, col: usize },
    /// A lake was seeded from a node already claimed by a resolved lake.
    AlreadyClaimed { row: usize, col: usize },
    /// Lake resolution left the outlet (or its upstream neighbour) undrained.
    UnresolvedOutlet { row: usize, col: usize },
    /// Following downstream links from this node returns to it.
    DrainageCycle { row: usize, col: usize },
    /// A grid-exchange file is missing a mandatory header key.
    MissingHeader(&'static str),
    /// A grid-exchange file contains a token that is not a number.
    Parse { line: usize, message: String },
    /// I/O error while reading a grid file.
    Io(std::io::Error),
}

impl fmt::Display for HydrologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HydrologyError::InvalidRaster(msg) => write!(f, "Invalid raster: {msg}"),
            HydrologyError::InvalidResampleFactor(factor) => {
                write!(f, "Invalid resample factor {factor}: must be at least 1")
            }
            HydrologyError::ShapeMismatch { expected, found } => write!(
                f,
                "Shape mismatch: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
            HydrologyError::FillBelowSurface {
                elevation,
                requested,
            } => write!(
                f,
                "Cannot fill below current level: elevation {elevation}, requested {requested}"
            ),
            HydrologyError::NotAPit { row, col } => {
                write!(f, "Node ({row}, {col}) is not a pit")
            }
            HydrologyError::AlreadyClaimed { row, col } => {
                write!(f, "Node ({row}, {col}) already belongs to a lake")
            }
            HydrologyError::UnresolvedOutlet { row, col } => write!(
                f,
                "Lake outlet at ({row}, {col}) does not drain after resolution"
            ),
            HydrologyError::DrainageCycle { row, col } => {
                write!(f, "Drainage links form a cycle through ({row}, {col})")
            }
            HydrologyError::MissingHeader(key) => write!(f, "Missing grid header: {key}"),
            HydrologyError::Parse { line, message } => {
                write!(f, "Parse error on line {line}: {message}")
            }
            HydrologyError::Io(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for HydrologyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HydrologyError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for HydrologyError {
    fn from(e: std::io::Error) -> Self {
        HydrologyError::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_shape_mismatch() {
        let err = HydrologyError::ShapeMismatch {
            expected: (5, 5),
            found: (4, 5),
        };
        let msg = format!("{err}");
        assert!(msg.contains("5x5"), "got: {msg}");
        assert!(msg.contains("4x5"), "got: {msg}");
    }

    #[test]
    fn test_display_fill_below_surface() {
        let err = HydrologyError::FillBelowSurface {
            elevation: 10.0,
            requested: 4.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("Cannot fill below"), "got: {msg}");
        assert!(msg.contains("4.5"), "got: {msg}");
    }

    #[test]
    fn test_display_missing_header() {
        let msg = format!("{}", HydrologyError::MissingHeader("nrows"));
        assert!(msg.contains("nrows"), "got: {msg}");
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such grid");
        let err: HydrologyError = io_err.into();
        assert!(matches!(err, HydrologyError::Io(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_non_io_has_no_source() {
        let err = HydrologyError::NotAPit { row: 1, col: 2 };
        assert!(std::error::Error::source(&err).is_none());
        let debug = format!("{err:?}");
        assert!(debug.contains("NotAPit"), "got: {debug}");
    }
}
